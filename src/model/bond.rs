//! Bond — orientation-independent type of an edge between two sites.
//!
//! A local bond identifier (`x[1]`) only means something inside one complex.
//! The `(agent, site) .. (site, agent)` pair does not depend on the complex, so it
//! is what the embedding engine compares across query and target.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::KappaExpression;
use crate::{Error, Result};

/// Canonical bond type `Agent.site..site.Agent`.
///
/// The lexicographically smaller `agent.site` end is always stored on the left,
/// so `A.s1..s2.B` and `B.s2..s1.A` are the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bond {
    left: (String, String),
    right: (String, String),
    canonical: String,
}

impl Bond {
    /// Bond between `(agent, site)` and `(agent, site)`, in either order.
    pub fn new(
        a: (impl Into<String>, impl Into<String>),
        b: (impl Into<String>, impl Into<String>),
    ) -> Self {
        let a = (a.0.into(), a.1.into());
        let b = (b.0.into(), b.1.into());
        let a_key = format!("{}.{}", a.0, a.1);
        let b_key = format!("{}.{}", b.0, b.1);
        let (left, right) = if a_key <= b_key { (a, b) } else { (b, a) };
        let canonical = format!("{}.{}..{}.{}", left.0, left.1, right.1, right.0);
        Self { left, right, canonical }
    }

    /// `(agent, site)` of the canonical left end.
    pub fn left(&self) -> (&str, &str) {
        (&self.left.0, &self.left.1)
    }

    /// `(agent, site)` of the canonical right end.
    pub fn right(&self) -> (&str, &str) {
        (&self.right.0, &self.right.1)
    }

    /// The same bond read from the other end. Canonicalization makes this the
    /// identity on values.
    pub fn reverse(&self) -> Bond {
        Bond::new(self.right.clone(), self.left.clone())
    }

    /// True if one end is `(agent, site)`.
    pub fn touches(&self, agent: &str, site: &str) -> bool {
        self.left() == (agent, site) || self.right() == (agent, site)
    }

    /// True for homotypic bonds such as `A.s..s.A`.
    pub fn is_symmetric(&self) -> bool {
        self.left == self.right
    }
}

impl KappaExpression for Bond {
    const KIND: &'static str = "bond";

    fn canonical_string(&self) -> &str {
        &self.canonical
    }
}

impl_canonical_identity!(Bond);
impl_canonical_order!(Bond);

impl FromStr for Bond {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::kappa::parse_bond(s)
    }
}
