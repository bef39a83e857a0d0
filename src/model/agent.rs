//! Agent — a named molecular entity with a signature of sites.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BondState, KappaExpression, Site};
use crate::{Error, Result};

/// Creation/deletion marker of an agent in a rule (`+` / `-`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbundanceChange {
    Created,
    Deleted,
}

impl fmt::Display for AbundanceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbundanceChange::Created => f.write_str("+"),
            AbundanceChange::Deleted => f.write_str("-"),
        }
    }
}

/// An agent: `[xN:]Name(site site ...)[+|-]`.
///
/// Sites are kept sorted by their canonical text, so the canonical form does not
/// depend on the order the signature was written in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Agent {
    name: String,
    sites: Vec<Site>,
    identifier: Option<u64>,
    change: Option<AbundanceChange>,
    /// site name → index into `sites`
    by_name: BTreeMap<String, usize>,
    /// canonical text without the `xN:` prefix
    type_text: String,
    canonical: String,
}

impl Agent {
    /// Build an agent from parsed sites. Fails if two sites share a name.
    pub fn new(
        name: impl Into<String>,
        mut sites: Vec<Site>,
        identifier: Option<u64>,
        change: Option<AbundanceChange>,
    ) -> Result<Self> {
        let name = name.into();
        sites.sort();
        let (type_text, canonical) = canonical_texts(&name, &sites, identifier, change);

        let mut by_name = BTreeMap::new();
        for (idx, site) in sites.iter().enumerate() {
            if by_name.insert(site.name().to_string(), idx).is_some() {
                return Err(Error::AgentParseError {
                    text: canonical,
                    message: format!("duplicate site '{}'", site.name()),
                });
            }
        }

        Ok(Self { name, sites, identifier, change, by_name, type_text, canonical })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sites in canonical order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Look up a site by name.
    pub fn site(&self, name: &str) -> Option<&Site> {
        self.by_name.get(name).map(|&idx| &self.sites[idx])
    }

    pub fn identifier(&self) -> Option<u64> {
        self.identifier
    }

    pub fn abundance_change(&self) -> Option<AbundanceChange> {
        self.change
    }

    /// Canonical text without the identifier prefix.
    pub fn type_string(&self) -> &str {
        &self.type_text
    }

    /// Equality of everything but the numeric identifier.
    pub fn same_type(&self, other: &Agent) -> bool {
        self.type_text == other.type_text
    }

    /// Local bond identifiers referenced by the present state of the signature,
    /// in site order. A self-bond appears twice.
    pub fn bond_ids(&self) -> Vec<u64> {
        self.sites.iter().filter_map(Site::bond_id).collect()
    }

    pub fn has_operation(&self) -> bool {
        self.sites.iter().any(Site::has_operation)
    }

    /// Same agent with concrete bond states (`N`, `site.Agent`) generalized to `_`.
    ///
    /// Local bond identifiers only mean something inside one complex; the relaxed
    /// agent is the form used to compare an agent against agents of other complexes.
    pub fn relaxed(&self) -> Agent {
        let sites = self
            .sites
            .iter()
            .map(|site| match site {
                Site::Port(port) if matches!(port.bond_state(), BondState::Bound(_) | BondState::BoundTo { .. }) => {
                    Site::Port(port.with_bond_state(BondState::BoundAny))
                }
                other => other.clone(),
            })
            .collect();
        Self::rebuilt(self, sites)
    }

    /// Same agent without its identifier.
    pub fn without_identifier(&self) -> Agent {
        let mut agent = self.clone();
        agent.identifier = None;
        agent.canonical = agent.type_text.clone();
        agent
    }

    fn rebuilt(template: &Agent, sites: Vec<Site>) -> Agent {
        // Renaming bond states never changes site names, so no duplicates can appear.
        let mut sites = sites;
        sites.sort();
        let (type_text, canonical) =
            canonical_texts(&template.name, &sites, template.identifier, template.change);
        let by_name = sites
            .iter()
            .enumerate()
            .map(|(idx, site)| (site.name().to_string(), idx))
            .collect();
        Agent {
            name: template.name.clone(),
            sites,
            identifier: template.identifier,
            change: template.change,
            by_name,
            type_text,
            canonical,
        }
    }

    /// Is the pattern `query` satisfied by this (host) agent?
    ///
    /// True iff the names match and every site of `query` is contained in the
    /// host site of the same name.
    pub fn contains(&self, query: &Agent) -> Result<bool> {
        if self.name != query.name {
            return Ok(false);
        }
        for q in &query.sites {
            match self.site(q.name()) {
                Some(host) => {
                    if !host.contains(q)? {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

/// `(type text, canonical text)` for sorted sites.
fn canonical_texts(
    name: &str,
    sites: &[Site],
    identifier: Option<u64>,
    change: Option<AbundanceChange>,
) -> (String, String) {
    let signature: Vec<&str> = sites.iter().map(|s| s.canonical_string()).collect();
    let mut type_text = format!("{name}({})", signature.join(" "));
    if let Some(change) = change {
        type_text.push_str(&change.to_string());
    }
    let canonical = match identifier {
        Some(id) => format!("x{id}:{type_text}"),
        None => type_text.clone(),
    };
    (type_text, canonical)
}

impl KappaExpression for Agent {
    const KIND: &'static str = "agent";

    fn canonical_string(&self) -> &str {
        &self.canonical
    }
}

impl_canonical_identity!(Agent);

/// Unidentified agents sort before identified ones; identifiers compare
/// numerically (`x9` before `x10`); ties fall back to the canonical text.
impl Ord for Agent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identifier
            .cmp(&other.identifier)
            .then_with(|| self.canonical.cmp(&other.canonical))
    }
}

impl PartialOrd for Agent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Agent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::kappa::parse_agent(s)
    }
}
