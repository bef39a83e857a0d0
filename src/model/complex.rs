//! Complex — a set of bonded agents; one molecular species.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Agent, Bond, BondState, KappaExpression, Site};
use crate::graph::{self, Embedding, MoleculeGraph};
use crate::{Error, Result};

/// A complex: agents in canonical order, with derived composition and bond data.
///
/// Every local bond identifier appears on exactly two site termini. Connectivity
/// is not checked here (rule patterns may be disconnected); the embedding engine
/// checks it before traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Complex {
    agents: Vec<Agent>,
    /// agent type → number of agents of that type
    composition: BTreeMap<String, usize>,
    bond_count: usize,
    /// identifier → index into `agents`; only when every agent is identified
    by_identifier: Option<BTreeMap<u64, usize>>,
    canonical: String,
}

impl Complex {
    /// Build a complex from parsed agents.
    pub fn new(mut agents: Vec<Agent>) -> Result<Self> {
        if agents.is_empty() {
            return Err(Error::ComplexParseError {
                text: String::new(),
                message: "complex has no agents".into(),
            });
        }
        agents.sort();
        let canonical = agents
            .iter()
            .map(|a| a.canonical_string())
            .collect::<Vec<_>>()
            .join(", ");
        let fail = |message: String| Error::ComplexParseError { text: canonical.clone(), message };

        let mut termini: BTreeMap<u64, usize> = BTreeMap::new();
        for agent in &agents {
            for id in agent.bond_ids() {
                *termini.entry(id).or_default() += 1;
            }
        }
        for (&id, &count) in &termini {
            match count {
                2 => {}
                1 => return Err(fail(format!("dangling bond {id}"))),
                n => return Err(fail(format!("bond {id} has {n} termini"))),
            }
        }
        let terminus_count: usize = termini.values().sum();

        let mut composition = BTreeMap::new();
        for agent in &agents {
            *composition.entry(agent.name().to_string()).or_default() += 1;
        }

        let by_identifier = if agents.iter().all(|a| a.identifier().is_some()) {
            let mut index = BTreeMap::new();
            for (idx, agent) in agents.iter().enumerate() {
                if let Some(id) = agent.identifier() {
                    if index.insert(id, idx).is_some() {
                        return Err(fail(format!("duplicate agent identifier x{id}")));
                    }
                }
            }
            Some(index)
        } else {
            None
        };

        Ok(Self {
            agents,
            composition,
            bond_count: terminus_count / 2,
            by_identifier,
            canonical,
        })
    }

    /// Agents in canonical order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Number of agents.
    pub fn size(&self) -> usize {
        self.agents.len()
    }

    /// Agent type → count.
    pub fn composition(&self) -> &BTreeMap<String, usize> {
        &self.composition
    }

    pub fn agent_types(&self) -> BTreeSet<&str> {
        self.composition.keys().map(String::as_str).collect()
    }

    /// Number of bonds (half the number of bond termini).
    pub fn bond_count(&self) -> usize {
        self.bond_count
    }

    /// Identifier → agent index, present only if every agent carries an identifier.
    pub fn identifier_index(&self) -> Option<&BTreeMap<u64, usize>> {
        self.by_identifier.as_ref()
    }

    pub fn agent_by_identifier(&self, id: u64) -> Option<&Agent> {
        self.by_identifier
            .as_ref()
            .and_then(|index| index.get(&id))
            .map(|&idx| &self.agents[idx])
    }

    /// Canonical types of all bonds, with multiplicity.
    pub fn bond_types(&self) -> BTreeMap<Bond, usize> {
        let mut ends: BTreeMap<u64, Vec<(&str, &str)>> = BTreeMap::new();
        for agent in &self.agents {
            for site in agent.sites() {
                if let Some(id) = site.bond_id() {
                    ends.entry(id).or_default().push((agent.name(), site.name()));
                }
            }
        }
        let mut types = BTreeMap::new();
        for pair in ends.values() {
            if let [a, b] = pair.as_slice() {
                *types.entry(Bond::new(*a, *b)).or_default() += 1;
            }
        }
        types
    }

    /// Graph projection: one node per agent, one edge per bond.
    ///
    /// Nodes are keyed by `offset + identifier` when every agent is identified,
    /// otherwise by `offset + position`.
    pub fn to_graph(&self, offset: u64) -> Result<MoleculeGraph> {
        MoleculeGraph::from_complex(self, offset)
    }

    /// Keys the projection uses for each agent, in agent order.
    pub(crate) fn node_keys(&self, offset: u64) -> Vec<u64> {
        match &self.by_identifier {
            Some(_) => self
                .agents
                .iter()
                .map(|a| offset + a.identifier().unwrap_or_default())
                .collect(),
            None => (0..self.agents.len() as u64).map(|pos| offset + pos).collect(),
        }
    }

    pub fn is_connected(&self) -> Result<bool> {
        Ok(self.to_graph(0)?.is_connected())
    }

    /// Occurrences of an agent pattern: agents of this complex that contain it.
    /// Bond identifiers of the pattern are generalized to `_`; typed partners
    /// (`x[s.B]`) must be reached through an actual bond of this complex.
    pub fn count_agent(&self, pattern: &Agent) -> Result<usize> {
        let relaxed = pattern.relaxed();
        let typed = pattern
            .sites()
            .iter()
            .any(|site| matches!(site, Site::Port(port) if matches!(port.bond_state(), BondState::BoundTo { .. })));
        let graph = if typed { Some(self.to_graph(0)?) } else { None };

        let mut count = 0;
        for (agent, key) in self.agents.iter().zip(self.node_keys(0)) {
            if !agent.contains(&relaxed)? {
                continue;
            }
            if let Some(graph) = &graph {
                if !graph.typed_bonds_hold(pattern, key) {
                    continue;
                }
            }
            count += 1;
        }
        Ok(count)
    }

    /// Embeddings of `query` into this complex.
    pub fn embed(&self, query: &Complex) -> Result<Embedding> {
        graph::embed(query, self)
    }

    /// Number of distinct occurrences of `query`, up to the query's own symmetry.
    pub fn embed_count(&self, query: &Complex) -> Result<usize> {
        Ok(self.embed(query)?.unique_count())
    }
}

impl KappaExpression for Complex {
    const KIND: &'static str = "complex";

    fn canonical_string(&self) -> &str {
        &self.canonical
    }
}

impl_canonical_identity!(Complex);
impl_canonical_order!(Complex);

impl FromStr for Complex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::kappa::parse_complex(s)
    }
}
