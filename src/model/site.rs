//! Sites — the smallest parsed unit of an agent signature.
//!
//! Two disjoint kinds:
//! - [`Port`]: `name[bond]{internal}`, carries a bond state and an internal state.
//! - [`Counter`]: `name{=N}` / `name{>=N}`, optionally with a `/+=M` or `/-=M` delta.
//!
//! Either state of a port may carry a present/future pair (`X/Y`), which makes the
//! port a *transition* rather than a concrete state. Containment is undefined for
//! transitions and reported as [`Error::UndefinedSatisfaction`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::KappaExpression;
use crate::{Error, Result};

// ============================================================================
// Bond and internal states
// ============================================================================

/// Bond state of a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondState {
    /// `.`: free.
    Unbound,
    /// `#`: unspecified.
    Wildcard,
    /// `_`: bound to something.
    BoundAny,
    /// `N`: bound through the local bond identifier `N`.
    Bound(u64),
    /// `site.Agent`: bound to a site of the given type.
    BoundTo { site: String, agent: String },
}

impl BondState {
    /// True for every state that guarantees a bond.
    pub fn is_bound(&self) -> bool {
        matches!(self, BondState::BoundAny | BondState::Bound(_) | BondState::BoundTo { .. })
    }

    /// Local bond identifier, if this is a concrete bond.
    pub fn bond_id(&self) -> Option<u64> {
        match self {
            BondState::Bound(id) => Some(*id),
            _ => None,
        }
    }

    /// Does a host in state `self` satisfy the query state `query`?
    fn satisfies(&self, query: &BondState) -> bool {
        match query {
            BondState::Wildcard => true,
            BondState::BoundAny => self.is_bound(),
            BondState::Unbound => matches!(self, BondState::Unbound),
            BondState::Bound(_) | BondState::BoundTo { .. } => self == query,
        }
    }
}

impl fmt::Display for BondState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondState::Unbound => f.write_str("."),
            BondState::Wildcard => f.write_str("#"),
            BondState::BoundAny => f.write_str("_"),
            BondState::Bound(id) => write!(f, "{id}"),
            BondState::BoundTo { site, agent } => write!(f, "{site}.{agent}"),
        }
    }
}

/// Internal state of a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InternalState {
    /// `#`: unspecified.
    Wildcard,
    /// A symbolic state label, e.g. `p` or `u`.
    Label(String),
}

impl InternalState {
    fn satisfies(&self, query: &InternalState) -> bool {
        match query {
            InternalState::Wildcard => true,
            InternalState::Label(_) => self == query,
        }
    }
}

impl fmt::Display for InternalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalState::Wildcard => f.write_str("#"),
            InternalState::Label(label) => f.write_str(label),
        }
    }
}

fn write_change<T: fmt::Display>(out: &mut String, current: &T, future: Option<&T>) {
    out.push_str(&current.to_string());
    if let Some(future) = future {
        out.push('/');
        out.push_str(&future.to_string());
    }
}

// ============================================================================
// Port
// ============================================================================

/// A binding/internal-state site: `name[bond]{internal}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Port {
    name: String,
    bond: BondState,
    bond_future: Option<BondState>,
    internal: InternalState,
    internal_future: Option<InternalState>,
    canonical: String,
}

impl Port {
    /// Build a port from already-validated parts.
    pub(crate) fn from_parts(
        name: String,
        bond: BondState,
        bond_future: Option<BondState>,
        internal: InternalState,
        internal_future: Option<InternalState>,
    ) -> Self {
        let mut canonical = name.clone();
        canonical.push('[');
        write_change(&mut canonical, &bond, bond_future.as_ref());
        canonical.push_str("]{");
        write_change(&mut canonical, &internal, internal_future.as_ref());
        canonical.push('}');
        Self { name, bond, bond_future, internal, internal_future, canonical }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bond_state(&self) -> &BondState {
        &self.bond
    }

    pub fn future_bond_state(&self) -> Option<&BondState> {
        self.bond_future.as_ref()
    }

    pub fn internal_state(&self) -> &InternalState {
        &self.internal
    }

    pub fn future_internal_state(&self) -> Option<&InternalState> {
        self.internal_future.as_ref()
    }

    /// True if either state is a present/future pair.
    pub fn has_operation(&self) -> bool {
        self.bond_future.is_some() || self.internal_future.is_some()
    }

    /// Local bond identifier of the present state, if any.
    pub fn bond_id(&self) -> Option<u64> {
        self.bond.bond_id()
    }

    /// Same port with the present bond state replaced.
    pub fn with_bond_state(&self, bond: BondState) -> Port {
        Port::from_parts(
            self.name.clone(),
            bond,
            self.bond_future.clone(),
            self.internal.clone(),
            self.internal_future.clone(),
        )
    }

    /// Is `query` satisfied by this (host) port?
    ///
    /// Ports with different names never contain each other. A pending operation
    /// on either side makes the question undefined.
    pub fn contains(&self, query: &Port) -> Result<bool> {
        if self.name != query.name {
            return Ok(false);
        }
        if self.has_operation() || query.has_operation() {
            return Err(Error::UndefinedSatisfaction(format!(
                "cannot test '{query}' against '{self}': site in transition"
            )));
        }
        Ok(self.bond.satisfies(&query.bond) && self.internal.satisfies(&query.internal))
    }
}

impl KappaExpression for Port {
    const KIND: &'static str = "port";

    fn canonical_string(&self) -> &str {
        &self.canonical
    }
}

impl_canonical_identity!(Port);
impl_canonical_order!(Port);

impl FromStr for Port {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::kappa::parse_port(s)
    }
}

// ============================================================================
// Counter
// ============================================================================

/// Tested value of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterTest {
    /// `=N`
    Equal(u64),
    /// `>=N`
    AtLeast(u64),
}

/// Pending change of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterDelta {
    /// `+=N`
    Increment(u64),
    /// `-=N`
    Decrement(u64),
}

/// A counter site: `name{=N}`, `name{>=N}`, `name{=N/+=M}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Counter {
    name: String,
    test: CounterTest,
    delta: Option<CounterDelta>,
    canonical: String,
}

impl Counter {
    pub(crate) fn from_parts(name: String, test: CounterTest, delta: Option<CounterDelta>) -> Self {
        let mut canonical = format!("{name}{{");
        match test {
            CounterTest::Equal(n) => canonical.push_str(&format!("={n}")),
            CounterTest::AtLeast(n) => canonical.push_str(&format!(">={n}")),
        }
        match delta {
            Some(CounterDelta::Increment(n)) => canonical.push_str(&format!("/+={n}")),
            Some(CounterDelta::Decrement(n)) => canonical.push_str(&format!("/-={n}")),
            None => {}
        }
        canonical.push('}');
        Self { name, test, delta, canonical }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self) -> CounterTest {
        self.test
    }

    pub fn delta(&self) -> Option<CounterDelta> {
        self.delta
    }

    pub fn has_operation(&self) -> bool {
        self.delta.is_some()
    }

    /// Counters are only compared for exact state equality.
    pub fn contains(&self, query: &Counter) -> Result<bool> {
        if self.name != query.name {
            return Ok(false);
        }
        if self.has_operation() || query.has_operation() {
            return Err(Error::UndefinedSatisfaction(format!(
                "cannot test '{query}' against '{self}': counter in transition"
            )));
        }
        Ok(self.test == query.test)
    }
}

impl KappaExpression for Counter {
    const KIND: &'static str = "counter";

    fn canonical_string(&self) -> &str {
        &self.canonical
    }
}

impl_canonical_identity!(Counter);
impl_canonical_order!(Counter);

impl FromStr for Counter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::kappa::parse_counter(s)
    }
}

// ============================================================================
// Site
// ============================================================================

/// One entry of an agent signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Site {
    Port(Port),
    Counter(Counter),
}

impl Site {
    pub fn name(&self) -> &str {
        match self {
            Site::Port(p) => p.name(),
            Site::Counter(c) => c.name(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Site::Port(_) => Port::KIND,
            Site::Counter(_) => Counter::KIND,
        }
    }

    pub fn as_port(&self) -> Option<&Port> {
        match self {
            Site::Port(p) => Some(p),
            Site::Counter(_) => None,
        }
    }

    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            Site::Counter(c) => Some(c),
            Site::Port(_) => None,
        }
    }

    pub fn has_operation(&self) -> bool {
        match self {
            Site::Port(p) => p.has_operation(),
            Site::Counter(c) => c.has_operation(),
        }
    }

    pub fn bond_id(&self) -> Option<u64> {
        self.as_port().and_then(Port::bond_id)
    }

    /// Is `query` satisfied by this (host) site? Port against counter is a
    /// comparison between incompatible kinds.
    pub fn contains(&self, query: &Site) -> Result<bool> {
        match (self, query) {
            (Site::Port(host), Site::Port(q)) => host.contains(q),
            (Site::Counter(host), Site::Counter(q)) => host.contains(q),
            (host, q) => Err(Error::EqualityError {
                left: host.kind(),
                right: q.kind(),
            }),
        }
    }
}

impl KappaExpression for Site {
    const KIND: &'static str = "site";

    fn canonical_string(&self) -> &str {
        match self {
            Site::Port(p) => p.canonical_string(),
            Site::Counter(c) => c.canonical_string(),
        }
    }
}

impl_canonical_identity!(Site);
impl_canonical_order!(Site);

impl FromStr for Site {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::kappa::parse_site(s)
    }
}

impl From<Port> for Site {
    fn from(port: Port) -> Self {
        Site::Port(port)
    }
}

impl From<Counter> for Site {
    fn from(counter: Counter) -> Self {
        Site::Counter(counter)
    }
}
