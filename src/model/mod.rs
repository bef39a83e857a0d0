//! # Kappa Value Model
//!
//! Immutable value types for Kappa state descriptions: sites, agents, bonds,
//! complexes and tokens. Every value derives its canonical Kappa text once at
//! construction; equality, hashing, ordering and `Display` all go through it.
//!
//! Design rule: no I/O, no graph algorithms, no mutation after construction.
//! Parsing lives in [`crate::kappa`]; embedding lives in [`crate::graph`].

/// Implements `PartialEq`, `Eq`, `Hash`, `Display` and the serde string bridge
/// for a type exposing `canonical_string()`.
macro_rules! impl_canonical_identity {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.canonical_string() == other.canonical_string()
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.canonical_string().hash(state);
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.canonical_string())
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> String {
                value.canonical_string().to_owned()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = crate::Error;

            fn try_from(text: String) -> crate::Result<Self> {
                text.parse()
            }
        }
    };
}

/// Orders a type by its canonical text.
macro_rules! impl_canonical_order {
    ($ty:ty) => {
        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.canonical_string().cmp(other.canonical_string())
            }
        }
    };
}

pub mod site;
pub mod agent;
pub mod bond;
pub mod complex;
pub mod token;

pub use site::{BondState, InternalState, Port, Counter, CounterTest, CounterDelta, Site};
pub use agent::{Agent, AbundanceChange};
pub use bond::Bond;
pub use complex::Complex;
pub use token::Token;

/// The one capability every Kappa value shares: a canonical text form.
pub trait KappaExpression {
    /// Entity kind, as reported by cross-kind comparison errors.
    const KIND: &'static str;

    /// Canonical Kappa text, computed once at construction.
    fn canonical_string(&self) -> &str;
}

/// Characters allowed after the first character of a Kappa identifier.
pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '~' | '+' | '-')
}

/// `[a-zA-Z][a-zA-Z0-9_~+-]*` or `[_~][a-zA-Z0-9_~+-]+`.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(is_identifier_char),
        Some('_' | '~') => {
            let rest = chars.as_str();
            !rest.is_empty() && rest.chars().all(is_identifier_char)
        }
        _ => false,
    }
}
