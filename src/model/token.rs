//! Token — a named scalar quantity tracked alongside complexes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::KappaExpression;
use crate::{Error, Result};

/// `VALUE NAME`, e.g. `1.5e3 atp`. The value is kept as written: it may be a
/// plain number (snapshots) or an operation text (rules).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token {
    name: String,
    value: String,
    canonical: String,
}

impl Token {
    pub(crate) fn from_parts(name: String, value: String) -> Self {
        let canonical = format!("{value} {name}");
        Self { name, value, canonical }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value text as written.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value as a number, when it is one.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.parse().ok()
    }
}

impl KappaExpression for Token {
    const KIND: &'static str = "token";

    fn canonical_string(&self) -> &str {
        &self.canonical
    }
}

impl_canonical_identity!(Token);
impl_canonical_order!(Token);

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::kappa::parse_token(s)
    }
}
