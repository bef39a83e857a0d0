//! # Mixture Snapshots
//!
//! A snapshot is the complete state of a simulated mixture at one sample time:
//! every distinct complex with its abundance, plus scalar token values.
//!
//! Snapshots are parsed once and then only answer read queries. Aggregates that
//! embed a pattern into every species fan out over a worker pool when the
//! `parallel` feature is on; each species is independent and results are summed.

pub mod parser;

pub use parser::{parse_entry, SnapshotEntry};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::graph::MoleculeGraph;
use crate::model::{Agent, Complex};
use crate::{Error, Result};

/// Parsed snapshot file.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    event: u64,
    uuid: Option<String>,
    time: f64,
    complexes: BTreeMap<Complex, u64>,
    tokens: BTreeMap<String, f64>,
}

/// Serializable digest of a snapshot for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub event: u64,
    pub uuid: Option<String>,
    pub time: f64,
    pub species_count: usize,
    pub total_mass: u64,
    pub composition: BTreeMap<String, u64>,
    pub size_distribution: BTreeMap<usize, u64>,
    pub tokens: BTreeMap<String, f64>,
}

impl Snapshot {
    /// Parse snapshot text. Any malformed line fails the whole parse.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading snapshot");
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Build a snapshot from already-parsed parts.
    pub fn from_parts(
        event: u64,
        uuid: Option<String>,
        time: f64,
        complexes: BTreeMap<Complex, u64>,
        tokens: BTreeMap<String, f64>,
    ) -> Self {
        Self { event, uuid, time, complexes, tokens }
    }

    // ========================================================================
    // Header and raw maps
    // ========================================================================

    pub fn event(&self) -> u64 {
        self.event
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// Sample time (`T0`).
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Complex → abundance, in canonical order.
    pub fn complexes(&self) -> &BTreeMap<Complex, u64> {
        &self.complexes
    }

    pub fn tokens(&self) -> &BTreeMap<String, f64> {
        &self.tokens
    }

    pub fn token_value(&self, name: &str) -> Option<f64> {
        self.tokens.get(name).copied()
    }

    /// Number of distinct species.
    pub fn species_count(&self) -> usize {
        self.complexes.len()
    }

    /// Abundance of exactly this species; zero if absent.
    pub fn abundance_of(&self, complex: &Complex) -> u64 {
        self.complexes.get(complex).copied().unwrap_or(0)
    }

    pub fn agent_types(&self) -> BTreeSet<&str> {
        self.complexes.keys().flat_map(|c| c.agent_types()).collect()
    }

    // ========================================================================
    // Distributions
    // ========================================================================

    /// Σ size × abundance.
    pub fn total_mass(&self) -> u64 {
        self.complexes
            .iter()
            .map(|(c, &n)| c.size() as u64 * n)
            .sum()
    }

    /// Complex size → total abundance of complexes of that size.
    pub fn size_distribution(&self) -> BTreeMap<usize, u64> {
        let mut distribution = BTreeMap::new();
        for (c, &n) in &self.complexes {
            *distribution.entry(c.size()).or_default() += n;
        }
        distribution
    }

    pub fn complexes_of_size(&self, size: usize) -> Vec<(&Complex, u64)> {
        self.select(|c, _| c.size() == size)
    }

    pub fn complexes_with_abundance(&self, abundance: u64) -> Vec<(&Complex, u64)> {
        self.select(|_, n| n == abundance)
    }

    pub fn largest_complexes(&self) -> Vec<(&Complex, u64)> {
        match self.complexes.keys().map(Complex::size).max() {
            Some(max) => self.complexes_of_size(max),
            None => Vec::new(),
        }
    }

    pub fn smallest_complexes(&self) -> Vec<(&Complex, u64)> {
        match self.complexes.keys().map(Complex::size).min() {
            Some(min) => self.complexes_of_size(min),
            None => Vec::new(),
        }
    }

    pub fn most_abundant_complexes(&self) -> Vec<(&Complex, u64)> {
        match self.complexes.values().max() {
            Some(&max) => self.complexes_with_abundance(max),
            None => Vec::new(),
        }
    }

    pub fn least_abundant_complexes(&self) -> Vec<(&Complex, u64)> {
        match self.complexes.values().min() {
            Some(&min) => self.complexes_with_abundance(min),
            None => Vec::new(),
        }
    }

    fn select(&self, keep: impl Fn(&Complex, u64) -> bool) -> Vec<(&Complex, u64)> {
        self.complexes
            .iter()
            .filter(|(c, n)| keep(c, **n))
            .map(|(c, &n)| (c, n))
            .collect()
    }

    /// Agent type → Σ local count × abundance over the whole mixture.
    pub fn composition(&self) -> BTreeMap<String, u64> {
        let mut composition = BTreeMap::new();
        for (c, &n) in &self.complexes {
            for (name, &count) in c.composition() {
                *composition.entry(name.clone()).or_default() += count as u64 * n;
            }
        }
        composition
    }

    // ========================================================================
    // Pattern abundance
    // ========================================================================

    /// Occurrences of an agent pattern in the mixture.
    pub fn abundance_of_agent(&self, pattern: &Agent) -> Result<u64> {
        self.abundance_of_agent_with(pattern, &EngineConfig::default())
    }

    pub fn abundance_of_agent_with(&self, pattern: &Agent, config: &EngineConfig) -> Result<u64> {
        self.weighted_sum(config, |c| Ok(c.count_agent(pattern)? as u64))
    }

    /// Occurrences of a complex pattern in the mixture, up to the pattern's own
    /// symmetry.
    pub fn abundance_of_pattern(&self, pattern: &Complex) -> Result<u64> {
        self.abundance_of_pattern_with(pattern, &EngineConfig::default())
    }

    pub fn abundance_of_pattern_with(&self, pattern: &Complex, config: &EngineConfig) -> Result<u64> {
        self.weighted_sum(config, |c| Ok(c.embed_count(pattern)? as u64))
    }

    /// Σ per_species(c) × abundance(c). The first failing species aborts the sum.
    fn weighted_sum<F>(&self, config: &EngineConfig, per_species: F) -> Result<u64>
    where
        F: Fn(&Complex) -> Result<u64> + Sync,
    {
        config.validate()?;
        let species: Vec<(&Complex, u64)> = self.complexes.iter().map(|(c, &n)| (c, n)).collect();

        #[cfg(feature = "parallel")]
        if config.should_parallelize(species.len()) {
            return parallel_sum(&species, config, &per_species);
        }

        debug!(species = species.len(), "weighted sum on calling thread");
        species
            .iter()
            .try_fold(0u64, |total, &(c, n)| Ok(total + per_species(c)? * n))
    }

    // ========================================================================
    // Graph projection
    // ========================================================================

    /// Union of every species' projection, each replicated `abundance` times
    /// with disjoint node keys. Node count equals [`Snapshot::total_mass`].
    pub fn to_graph(&self) -> Result<MoleculeGraph> {
        let mut graph = MoleculeGraph::new();
        let mut offset = 0u64;
        for (complex, &abundance) in &self.complexes {
            let span = match complex.identifier_index() {
                Some(index) => index.keys().next_back().map_or(0, |&max| max + 1),
                None => complex.size() as u64,
            };
            for _ in 0..abundance {
                graph.merge(complex.to_graph(offset)?)?;
                offset += span;
            }
        }

        let mass = self.total_mass();
        if graph.node_count() as u64 != mass {
            return Err(Error::ProjectionError(format!(
                "projection has {} nodes, total mass is {mass}",
                graph.node_count()
            )));
        }
        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "snapshot projected");
        Ok(graph)
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            event: self.event,
            uuid: self.uuid.clone(),
            time: self.time,
            species_count: self.species_count(),
            total_mass: self.total_mass(),
            composition: self.composition(),
            size_distribution: self.size_distribution(),
            tokens: self.tokens.clone(),
        }
    }
}

#[cfg(feature = "parallel")]
fn parallel_sum<F>(species: &[(&Complex, u64)], config: &EngineConfig, per_species: &F) -> Result<u64>
where
    F: Fn(&Complex) -> Result<u64> + Sync,
{
    use rayon::prelude::*;

    debug!(
        species = species.len(),
        workers = config.worker_threads,
        "weighted sum on worker pool"
    );
    let run = || {
        species
            .par_iter()
            .map(|&(c, n)| per_species(c).map(|k| k * n))
            .try_reduce(|| 0, |a, b| Ok(a + b))
    };
    if config.worker_threads == 0 {
        return run();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))?;
    pool.install(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNAPSHOT: &str = r#"// Snapshot [Event: 300]
// "uuid" : "0f3c-77"
%def: "T0" "12.5"

%init: 3 /*2 agents*/ A(x[1]), B(x[1])
%init: 5 /*1 agents*/ A(x[.])
%init: 1 /*3 agents*/ Bob(h[1] t[2]), Bob(h[2] t[3]), Bob(h[3] t[1])
%init: 40.5 atp
"#;

    fn snapshot() -> Snapshot {
        Snapshot::parse(SNAPSHOT).unwrap()
    }

    #[test]
    fn test_header() {
        let s = snapshot();
        assert_eq!(s.event(), 300);
        assert_eq!(s.uuid(), Some("0f3c-77"));
        assert_eq!(s.time(), 12.5);
        assert_eq!(s.token_value("atp"), Some(40.5));
    }

    #[test]
    fn test_mass_and_distribution() {
        let s = snapshot();
        assert_eq!(s.total_mass(), 3 * 2 + 5 + 3);
        assert_eq!(
            s.size_distribution(),
            BTreeMap::from([(1, 5), (2, 3), (3, 1)])
        );
        assert_eq!(s.largest_complexes().len(), 1);
        assert_eq!(s.largest_complexes()[0].0.size(), 3);
        assert_eq!(s.smallest_complexes()[0].1, 5);
        assert_eq!(s.most_abundant_complexes()[0].0.size(), 1);
        assert_eq!(s.least_abundant_complexes()[0].1, 1);
    }

    #[test]
    fn test_composition() {
        let composition = snapshot().composition();
        assert_eq!(composition.get("A"), Some(&8));
        assert_eq!(composition.get("B"), Some(&3));
        assert_eq!(composition.get("Bob"), Some(&3));
    }

    #[test]
    fn test_pattern_abundance_sequential_and_parallel() {
        let s = snapshot();
        let free_a: Agent = "A(x[.])".parse().unwrap();
        let dimer: Complex = "A(x[1]), B(x[1])".parse().unwrap();
        let bob_pair: Complex = "Bob(h[1]), Bob(t[1])".parse().unwrap();

        let sequential = EngineConfig::sequential();
        let eager = EngineConfig::default().with_parallel_threshold(1).with_worker_threads(2);
        for config in [&sequential, &eager] {
            assert_eq!(s.abundance_of_agent_with(&free_a, config).unwrap(), 5);
            assert_eq!(s.abundance_of_pattern_with(&dimer, config).unwrap(), 3);
            assert_eq!(s.abundance_of_pattern_with(&bob_pair, config).unwrap(), 3);
        }
    }

    #[test]
    fn test_pattern_errors_surface() {
        let s = snapshot();
        let disconnected: Complex = "A(), B()".parse().unwrap();
        let eager = EngineConfig::default().with_parallel_threshold(1);
        assert!(matches!(
            s.abundance_of_pattern_with(&disconnected, &eager),
            Err(Error::DisconnectedGraph(_))
        ));
    }

    #[test]
    fn test_projection_matches_mass() {
        let s = snapshot();
        let graph = s.to_graph().unwrap();
        assert_eq!(graph.node_count() as u64, s.total_mass());
        assert_eq!(graph.edge_count(), 3 + 3);
        assert_eq!(graph.component_count(), 3 + 5 + 1);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = snapshot().summary();
        let json = serde_json::to_string(&summary).unwrap();
        let back: SnapshotSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
        assert_eq!(back.species_count, 3);
    }
}
