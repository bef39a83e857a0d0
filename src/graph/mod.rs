//! # Site Graph
//!
//! Multigraph projection of complexes: one node per agent, one edge per bond.
//! Nodes carry the agent; edges carry the local bond id, the canonical [`Bond`]
//! type and both site termini.
//!
//! Design rule: a graph is derived from a [`Complex`] and never edited in place,
//! except by [`MoleculeGraph::merge`] when composing a whole mixture.

pub mod embedding;

pub use embedding::{embed, Embedding, NetMap};

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::model::{Agent, Bond, BondState, Complex, KappaExpression, Site};
use crate::{Error, Result};

// ============================================================================
// Edge types
// ============================================================================

/// One end of a bond.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Terminus {
    pub node: u64,
    pub agent: String,
    pub site: String,
}

/// A bond between two site termini. `a` and `b` are both ends; a self-bond has
/// `a.node == b.node`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BondEdge {
    pub local_id: u64,
    pub bond: Bond,
    pub a: Terminus,
    pub b: Terminus,
}

impl BondEdge {
    pub fn is_loop(&self) -> bool {
        self.a.node == self.b.node
    }

    /// The node at the other end from `node`.
    pub fn other_node(&self, node: u64) -> Option<u64> {
        if self.a.node == node {
            Some(self.b.node)
        } else if self.b.node == node {
            Some(self.a.node)
        } else {
            None
        }
    }
}

/// A bond read from one of its ends.
#[derive(Debug, Clone, Copy)]
pub struct OrientedEdge<'g> {
    /// Index into [`MoleculeGraph::edges`].
    pub edge: usize,
    pub local_id: u64,
    pub from: &'g Terminus,
    pub to: &'g Terminus,
}

// ============================================================================
// MoleculeGraph
// ============================================================================

/// Adjacency-list multigraph of agents.
#[derive(Debug, Clone, Default)]
pub struct MoleculeGraph {
    nodes: BTreeMap<u64, Agent>,
    edges: Vec<BondEdge>,
    /// node → indices into `edges`; a self-bond is listed once
    adjacency: HashMap<u64, SmallVec<[usize; 4]>>,
}

impl MoleculeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project a complex. Node keys start at `offset`; see [`Complex::to_graph`].
    pub fn from_complex(complex: &Complex, offset: u64) -> Result<Self> {
        let keys = complex.node_keys(offset);
        let mut graph = MoleculeGraph::new();
        let mut ends: BTreeMap<u64, Vec<Terminus>> = BTreeMap::new();

        for (&key, agent) in keys.iter().zip(complex.agents()) {
            if graph.nodes.insert(key, agent.clone()).is_some() {
                return Err(Error::ProjectionError(format!(
                    "node {key} appears twice in '{}'",
                    complex.canonical_string()
                )));
            }
            graph.adjacency.insert(key, SmallVec::new());
            for site in agent.sites() {
                if let Some(id) = site.bond_id() {
                    ends.entry(id).or_default().push(Terminus {
                        node: key,
                        agent: agent.name().to_string(),
                        site: site.name().to_string(),
                    });
                }
            }
        }

        for (local_id, termini) in ends {
            let [a, b]: [Terminus; 2] = termini.try_into().map_err(|t: Vec<Terminus>| {
                Error::ProjectionError(if t.len() == 1 {
                    format!("dangling bond {local_id}")
                } else {
                    format!("bond {local_id} has {} termini", t.len())
                })
            })?;
            let bond = Bond::new((a.agent.as_str(), a.site.as_str()), (b.agent.as_str(), b.site.as_str()));
            graph.push_edge(BondEdge { local_id, bond, a, b });
        }

        Ok(graph)
    }

    fn push_edge(&mut self, edge: BondEdge) {
        let idx = self.edges.len();
        self.adjacency.entry(edge.a.node).or_default().push(idx);
        if !edge.is_loop() {
            self.adjacency.entry(edge.b.node).or_default().push(idx);
        }
        self.edges.push(edge);
    }

    /// Nodes in key order.
    pub fn nodes(&self) -> impl Iterator<Item = (u64, &Agent)> {
        self.nodes.iter().map(|(&k, a)| (k, a))
    }

    pub fn agent(&self, node: u64) -> Option<&Agent> {
        self.nodes.get(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[BondEdge] {
        &self.edges
    }

    pub fn incident_edges(&self, node: u64) -> impl Iterator<Item = &BondEdge> {
        self.adjacency
            .get(&node)
            .into_iter()
            .flat_map(|idxs| idxs.iter().map(|&i| &self.edges[i]))
    }

    /// Number of bond termini on `node`; a self-bond counts twice.
    pub fn degree(&self, node: u64) -> usize {
        self.incident_edges(node)
            .map(|e| if e.is_loop() { 2 } else { 1 })
            .sum()
    }

    /// Distinct nodes bonded to `node`.
    pub fn neighbors(&self, node: u64) -> BTreeSet<u64> {
        self.incident_edges(node)
            .filter_map(|e| e.other_node(node))
            .collect()
    }

    /// Every bond of `node`, read away from it. A self-bond is yielded once per
    /// orientation.
    pub fn outgoing(&self, node: u64) -> SmallVec<[OrientedEdge<'_>; 4]> {
        let mut out = SmallVec::new();
        let Some(idxs) = self.adjacency.get(&node) else {
            return out;
        };
        for &idx in idxs {
            let e = &self.edges[idx];
            if e.a.node == node {
                out.push(OrientedEdge { edge: idx, local_id: e.local_id, from: &e.a, to: &e.b });
            }
            if e.b.node == node {
                out.push(OrientedEdge { edge: idx, local_id: e.local_id, from: &e.b, to: &e.a });
            }
        }
        out
    }

    /// Whether every typed port of `pattern` (`x[s.B]`) holds at `node`: either
    /// the node's own port carries the same typed state, or a bond leaves that
    /// site towards site `s` of a `B`.
    pub fn typed_bonds_hold(&self, pattern: &Agent, node: u64) -> bool {
        let Some(host) = self.agent(node) else {
            return false;
        };
        let outgoing = self.outgoing(node);
        pattern.sites().iter().all(|site| {
            let Site::Port(port) = site else {
                return true;
            };
            let typed = port.bond_state();
            let BondState::BoundTo { site: partner_site, agent: partner } = typed else {
                return true;
            };
            if let Some(Site::Port(own)) = host.site(port.name()) {
                if own.bond_state() == typed {
                    return true;
                }
            }
            outgoing.iter().any(|e| {
                e.from.site == port.name() && e.to.site == *partner_site && e.to.agent == *partner
            })
        })
    }

    /// Keys of nodes whose agent is of type `name`, in key order.
    pub fn nodes_of_type(&self, name: &str) -> Vec<u64> {
        self.nodes
            .iter()
            .filter(|(_, agent)| agent.name() == name)
            .map(|(&k, _)| k)
            .collect()
    }

    fn reachable_from(&self, start: u64, seen: &mut HashSet<u64>) {
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(node) = queue.pop_front() {
            for next in self.neighbors(node) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    /// True if every node is reachable from every other. The empty graph is
    /// connected.
    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }

    pub fn component_count(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        let mut components = 0;
        for &node in self.nodes.keys() {
            if !seen.contains(&node) {
                self.reachable_from(node, &mut seen);
                components += 1;
            }
        }
        components
    }

    /// Absorb `other`. Node keys must be disjoint.
    pub fn merge(&mut self, other: MoleculeGraph) -> Result<()> {
        if let Some(&clash) = other.nodes.keys().find(|k| self.nodes.contains_key(*k)) {
            return Err(Error::ProjectionError(format!(
                "node {clash} is present in both graphs"
            )));
        }
        debug!(
            nodes = other.node_count(),
            edges = other.edge_count(),
            "merging graph"
        );
        for (key, agent) in other.nodes {
            self.nodes.insert(key, agent);
            self.adjacency.entry(key).or_default();
        }
        for edge in other.edges {
            self.push_edge(edge);
        }
        Ok(())
    }
}
