//! # Pattern Embedding
//!
//! Counts placements of a query complex inside a target complex.
//!
//! Kappa site graphs are rigid: site names are unique per agent and a site holds
//! at most one bond. Once one query agent is pinned to a target agent, every
//! query bond read away from it names a single target bond, so a placement is
//! found by one guided walk per anchor candidate with no backtracking. The cost
//! is O(anchors × query agents × bonds per agent).
//!
//! Walks from different anchors can land on the same image when the query has
//! symmetries of its own (a ring matched against itself from each of its
//! members). [`Embedding::unique`] collapses those.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use hashbrown::HashSet;
use tracing::{debug, trace};

use super::MoleculeGraph;
use crate::model::{Complex, KappaExpression};
use crate::{Error, Result};

// ============================================================================
// NetMap
// ============================================================================

/// One placement: query node → target node, query bond → target bond.
///
/// Equality and hashing use the image only (target nodes and target bonds, both
/// sorted). Two placements with the same image differ by an automorphism of the
/// query, so a set of `NetMap`s counts occurrences rather than placements.
#[derive(Debug, Clone)]
pub struct NetMap {
    nodes: Vec<(u64, u64)>,
    bonds: Vec<(u64, u64)>,
    image_nodes: Vec<u64>,
    image_bonds: Vec<u64>,
}

impl NetMap {
    fn new(nodes: BTreeMap<u64, u64>, bonds: BTreeMap<u64, u64>) -> Self {
        let mut image_nodes: Vec<u64> = nodes.values().copied().collect();
        image_nodes.sort_unstable();
        let mut image_bonds: Vec<u64> = bonds.values().copied().collect();
        image_bonds.sort_unstable();
        Self {
            nodes: nodes.into_iter().collect(),
            bonds: bonds.into_iter().collect(),
            image_nodes,
            image_bonds,
        }
    }

    /// `(query node, target node)` pairs, sorted by query node.
    pub fn node_pairs(&self) -> &[(u64, u64)] {
        &self.nodes
    }

    /// `(query bond id, target bond id)` pairs, sorted by query bond id.
    pub fn bond_pairs(&self) -> &[(u64, u64)] {
        &self.bonds
    }

    pub fn target_of(&self, query_node: u64) -> Option<u64> {
        self.nodes
            .binary_search_by_key(&query_node, |&(q, _)| q)
            .ok()
            .map(|i| self.nodes[i].1)
    }

    /// Target nodes covered by this placement, sorted.
    pub fn image(&self) -> &[u64] {
        &self.image_nodes
    }
}

impl PartialEq for NetMap {
    fn eq(&self, other: &Self) -> bool {
        self.image_nodes == other.image_nodes && self.image_bonds == other.image_bonds
    }
}

impl Eq for NetMap {}

impl Hash for NetMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.image_nodes.hash(state);
        self.image_bonds.hash(state);
    }
}

// ============================================================================
// Embedding
// ============================================================================

/// Result of [`embed`].
#[derive(Debug, Clone, Default)]
pub struct Embedding {
    raw: Vec<NetMap>,
    unique: HashSet<NetMap>,
}

impl Embedding {
    /// One entry per successful anchor walk.
    pub fn raw(&self) -> &[NetMap] {
        &self.raw
    }

    /// Raw placements up to query symmetry.
    pub fn unique(&self) -> &HashSet<NetMap> {
        &self.unique
    }

    pub fn raw_count(&self) -> usize {
        self.raw.len()
    }

    pub fn unique_count(&self) -> usize {
        self.unique.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Cheap checks that need no graph: sizes and per-type composition.
fn fast_reject(query: &Complex, target: &Complex) -> Option<String> {
    if query.size() > target.size() {
        return Some(format!("query has {} agents, target {}", query.size(), target.size()));
    }
    if query.bond_count() > target.bond_count() {
        return Some(format!(
            "query has {} bonds, target {}",
            query.bond_count(),
            target.bond_count()
        ));
    }
    for (name, &count) in query.composition() {
        let available = target.composition().get(name).copied().unwrap_or(0);
        if count > available {
            return Some(format!("query needs {count} {name}, target has {available}"));
        }
    }
    None
}

/// Find every placement of `query` in `target`.
///
/// A composition mismatch yields an empty [`Embedding`] without building any
/// graph. Otherwise both complexes must be connected.
pub fn embed(query: &Complex, target: &Complex) -> Result<Embedding> {
    if let Some(reason) = fast_reject(query, target) {
        trace!(query = %query, target = %target, %reason, "fast rejection");
        return Ok(Embedding::default());
    }

    let query_graph = query.to_graph(0)?;
    let target_graph = target.to_graph(0)?;
    for (graph, complex) in [(&query_graph, query), (&target_graph, target)] {
        if !graph.is_connected() {
            return Err(Error::DisconnectedGraph(format!(
                "'{}' has {} components",
                complex.canonical_string(),
                graph.component_count()
            )));
        }
    }

    // Rarest query type; the composition check guarantees the target has it.
    let Some(anchor_type) = query
        .composition()
        .iter()
        .min_by_key(|(_, count)| **count)
        .map(|(name, _)| name.as_str())
    else {
        return Ok(Embedding::default());
    };
    let Some(&query_anchor) = query_graph.nodes_of_type(anchor_type).first() else {
        return Ok(Embedding::default());
    };

    let mut embedding = Embedding::default();
    for target_anchor in target_graph.nodes_of_type(anchor_type) {
        let mut walk = Walk::new(&query_graph, &target_graph);
        let placed = walk.run(query_anchor, target_anchor)?
            && walk.node_map.len() == query_graph.node_count();
        trace!(anchor = target_anchor, placed, "anchor walk");
        if placed {
            let netmap = NetMap::new(walk.node_map, walk.bond_map);
            embedding.unique.insert(netmap.clone());
            embedding.raw.push(netmap);
        }
    }

    debug!(
        query = %query,
        target = %target,
        raw = embedding.raw_count(),
        unique = embedding.unique_count(),
        "embedding complete"
    );
    Ok(embedding)
}

// ============================================================================
// Guided walk
// ============================================================================

/// State of one anchor walk. Dropped when the walk ends, so nothing carries over
/// between anchors.
struct Walk<'g> {
    query: &'g MoleculeGraph,
    target: &'g MoleculeGraph,
    node_map: BTreeMap<u64, u64>,
    used_targets: HashSet<u64>,
    bond_map: BTreeMap<u64, u64>,
    /// query edge indices already traversed
    followed: HashSet<usize>,
}

impl<'g> Walk<'g> {
    fn new(query: &'g MoleculeGraph, target: &'g MoleculeGraph) -> Self {
        Self {
            query,
            target,
            node_map: BTreeMap::new(),
            used_targets: HashSet::new(),
            bond_map: BTreeMap::new(),
            followed: HashSet::new(),
        }
    }

    /// Map `anchor_q` to `anchor_t` and extend the placement along every query
    /// bond. Pending `(query node, target node)` pairs sit on a worklist, so the
    /// walk depth is bounded by the heap rather than the call stack.
    fn run(&mut self, anchor_q: u64, anchor_t: u64) -> Result<bool> {
        let query = self.query;
        let target = self.target;
        let mut pending: Vec<(u64, u64)> = vec![(anchor_q, anchor_t)];

        while let Some((q, t)) = pending.pop() {
            if let Some(&mapped) = self.node_map.get(&q) {
                if mapped != t {
                    return Ok(false);
                }
                continue;
            }
            if self.used_targets.contains(&t) {
                return Ok(false);
            }
            let (Some(q_agent), Some(t_agent)) = (query.agent(q), target.agent(t)) else {
                return Ok(false);
            };
            if !t_agent.contains(&q_agent.relaxed())? || !target.typed_bonds_hold(q_agent, t) {
                return Ok(false);
            }

            self.node_map.insert(q, t);
            self.used_targets.insert(t);

            let t_out = target.outgoing(t);
            for q_edge in query.outgoing(q) {
                if !self.followed.insert(q_edge.edge) {
                    continue;
                }
                let matched = t_out.iter().find(|t_edge| {
                    t_edge.from.site == q_edge.from.site
                        && t_edge.to.agent == q_edge.to.agent
                        && t_edge.to.site == q_edge.to.site
                });
                let Some(t_edge) = matched else {
                    return Ok(false);
                };
                match self.bond_map.insert(q_edge.local_id, t_edge.local_id) {
                    Some(previous) if previous != t_edge.local_id => return Ok(false),
                    _ => {}
                }
                pending.push((q_edge.to.node, t_edge.to.node));
            }
        }
        Ok(true)
    }
}
