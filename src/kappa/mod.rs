//! # Kappa Language
//!
//! Strict, canonicalizing parser for Kappa text fragments.
//! Pure functions with no I/O and no graph dependency.
//!
//! Each entry point returns the typed error of the entity it parses. For text of
//! unknown kind, [`parse_expression`] picks the grammar from structural cues and
//! returns a tagged [`KappaEntity`].

pub mod parser;

use std::fmt;

use crate::model::{Agent, Bond, Complex, Counter, KappaExpression, Port, Site, Token};
use crate::{Error, Result};

/// Parse a port: `name[bond]{internal}`.
pub fn parse_port(text: &str) -> Result<Port> {
    parser::port(text).map_err(|message| Error::PortParseError {
        text: text.to_string(),
        message,
    })
}

/// Parse a counter: `name{=N}`, `name{>=N}`, `name{=N/+=M}`.
pub fn parse_counter(text: &str) -> Result<Counter> {
    parser::counter(text).map_err(|message| Error::CounterParseError {
        text: text.to_string(),
        message,
    })
}

/// Parse a site, dispatching on counter syntax.
pub fn parse_site(text: &str) -> Result<Site> {
    if parser::looks_like_counter(text) {
        parse_counter(text).map(Site::Counter)
    } else {
        parse_port(text).map(Site::Port)
    }
}

/// Parse a single agent: `[xN:]Name(sites)[+|-]`.
pub fn parse_agent(text: &str) -> Result<Agent> {
    parser::agent(text).map_err(|message| Error::AgentParseError {
        text: text.to_string(),
        message,
    })
}

/// Parse a list of agents into a complex.
pub fn parse_complex(text: &str) -> Result<Complex> {
    let complex_error = |message: String| Error::ComplexParseError {
        text: text.to_string(),
        message,
    };

    let raw = parser::split_agents(text).map_err(complex_error)?;
    let mut agents = Vec::with_capacity(raw.len());
    for agent in raw {
        agents.push(parse_agent(agent).map_err(|e| complex_error(e.to_string()))?);
    }

    Complex::new(agents).map_err(|e| match e {
        Error::ComplexParseError { message, .. } => complex_error(message),
        other => other,
    })
}

/// Parse a bond type: `Agent.site..site.Agent`.
pub fn parse_bond(text: &str) -> Result<Bond> {
    parser::bond(text).map_err(|message| Error::BondParseError {
        text: text.to_string(),
        message,
    })
}

/// Parse a token: `VALUE NAME`.
pub fn parse_token(text: &str) -> Result<Token> {
    parser::token(text).map_err(|message| Error::TokenParseError {
        text: text.to_string(),
        message,
    })
}

// ============================================================================
// Grammar dispatch
// ============================================================================

/// A parsed Kappa expression of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KappaEntity {
    Port(Port),
    Counter(Counter),
    Agent(Agent),
    Complex(Complex),
    Bond(Bond),
    Token(Token),
}

impl KappaEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            KappaEntity::Port(_) => Port::KIND,
            KappaEntity::Counter(_) => Counter::KIND,
            KappaEntity::Agent(_) => Agent::KIND,
            KappaEntity::Complex(_) => Complex::KIND,
            KappaEntity::Bond(_) => Bond::KIND,
            KappaEntity::Token(_) => Token::KIND,
        }
    }

    pub fn canonical_string(&self) -> &str {
        match self {
            KappaEntity::Port(v) => v.canonical_string(),
            KappaEntity::Counter(v) => v.canonical_string(),
            KappaEntity::Agent(v) => v.canonical_string(),
            KappaEntity::Complex(v) => v.canonical_string(),
            KappaEntity::Bond(v) => v.canonical_string(),
            KappaEntity::Token(v) => v.canonical_string(),
        }
    }

    /// Equality that refuses to compare different kinds.
    pub fn try_eq(&self, other: &KappaEntity) -> Result<bool> {
        if self.kind() != other.kind() {
            return Err(Error::EqualityError {
                left: self.kind(),
                right: other.kind(),
            });
        }
        Ok(self.canonical_string() == other.canonical_string())
    }
}

impl fmt::Display for KappaEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_string())
    }
}

/// Parse text of unknown kind.
///
/// Structural cues, in order: `..` ⇒ bond; parentheses ⇒ agent (one) or complex
/// (several); whitespace ⇒ token; `{=`/`{>=` ⇒ counter; anything else ⇒ port.
pub fn parse_expression(text: &str) -> Result<KappaEntity> {
    let text = text.trim();
    if text.contains("..") {
        return parse_bond(text).map(KappaEntity::Bond);
    }
    if text.contains('(') {
        let agents = parser::split_agents(text).map_err(|message| Error::ComplexParseError {
            text: text.to_string(),
            message,
        })?;
        return if agents.len() == 1 {
            parse_agent(text).map(KappaEntity::Agent)
        } else {
            parse_complex(text).map(KappaEntity::Complex)
        };
    }
    if text.contains(char::is_whitespace) {
        return parse_token(text).map(KappaEntity::Token);
    }
    if parser::looks_like_counter(text) {
        return parse_counter(text).map(KappaEntity::Counter);
    }
    parse_port(text).map(KappaEntity::Port)
}
