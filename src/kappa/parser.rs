//! Kappa recursive descent parser.
//!
//! Scannerless: Kappa identifiers may contain `+`, `-` and `~`, so token
//! boundaries depend on context and the parser reads characters directly.
//! Supports:
//! - ports `name[bond]{internal}` with `X/Y` transitions
//! - counters `name{=N}`, `name{>=N}`, `name{=N/+=M}`
//! - agents `xN:Name(sites)+`
//! - agent lists (complexes), bond types, tokens
//!
//! Functions here report plain messages; [`super`] wraps them into the typed
//! [`crate::Error`] variant of the entity being parsed.

use crate::model::{
    is_identifier, is_identifier_char, AbundanceChange, Agent, Bond, BondState, Counter,
    CounterDelta, CounterTest, InternalState, Port, Token,
};
use crate::Error;

pub(crate) type ParseResult<T> = std::result::Result<T, String>;

/// Parser state: a character cursor over one expression.
struct Cursor<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> ParseResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
        &self.src[start..self.pos]
    }

    /// Text up to `close`, consuming the delimiter.
    fn take_until(&mut self, close: char) -> ParseResult<&'s str> {
        let rest = &self.src[self.pos..];
        match rest.find(close) {
            Some(idx) => {
                self.pos += idx + close.len_utf8();
                Ok(&rest[..idx])
            }
            None => Err(self.error(format!("unterminated block, expected '{close}'"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> String {
        format!("{} at position {}", message.into(), self.pos)
    }
}

fn identifier<'s>(c: &mut Cursor<'s>) -> ParseResult<&'s str> {
    let start = c.pos;
    let name = c.take_while(is_identifier_char);
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(format!("invalid name '{name}' at position {start}"))
    }
}

fn number(s: &str) -> ParseResult<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected a number, got '{s}'"));
    }
    s.parse().map_err(|e| format!("number '{s}': {e}"))
}

/// `X` or `X/Y`.
fn transition<T>(inner: &str, state: fn(&str) -> ParseResult<T>) -> ParseResult<(T, Option<T>)> {
    match inner.split_once('/') {
        Some((now, next)) => Ok((state(now)?, Some(state(next)?))),
        None => Ok((state(inner)?, None)),
    }
}

fn bond_state(s: &str) -> ParseResult<BondState> {
    match s {
        "." => Ok(BondState::Unbound),
        "#" => Ok(BondState::Wildcard),
        "_" => Ok(BondState::BoundAny),
        s if s.bytes().next().is_some_and(|b| b.is_ascii_digit()) => number(s).map(BondState::Bound),
        s => match s.split_once('.') {
            Some((site, agent)) if is_identifier(site) && is_identifier(agent) => {
                Ok(BondState::BoundTo { site: site.to_string(), agent: agent.to_string() })
            }
            _ => Err(format!("invalid bond state '{s}'")),
        },
    }
}

fn internal_state(s: &str) -> ParseResult<InternalState> {
    match s {
        "#" => Ok(InternalState::Wildcard),
        s if !s.is_empty() && s.chars().all(is_identifier_char) => {
            Ok(InternalState::Label(s.to_string()))
        }
        _ => Err(format!("invalid internal state '{s}'")),
    }
}

/// True when the text uses counter syntax (`{=` or `{>=`).
pub(crate) fn looks_like_counter(text: &str) -> bool {
    text.contains("{=") || text.contains("{>=")
}

// ============================================================================
// Sites
// ============================================================================

pub(crate) fn port(text: &str) -> ParseResult<Port> {
    let mut c = Cursor::new(text.trim());
    let name = identifier(&mut c)?;

    let mut bond = None;
    let mut internal = None;
    while let Some(ch) = c.peek() {
        match ch {
            '[' if bond.is_none() => {
                c.advance();
                let inner = c.take_until(']')?;
                bond = Some(transition(inner, bond_state).map_err(|m| c.error(m))?);
            }
            '{' if internal.is_none() => {
                c.advance();
                let inner = c.take_until('}')?;
                internal = Some(transition(inner, internal_state).map_err(|m| c.error(m))?);
            }
            '[' | '{' => return Err(c.error(format!("repeated '{ch}' block"))),
            other => return Err(c.error(format!("unexpected '{other}'"))),
        }
    }

    let (bond, bond_future) = bond.unwrap_or((BondState::Wildcard, None));
    let (internal, internal_future) = internal.unwrap_or((InternalState::Wildcard, None));
    Ok(Port::from_parts(name.to_string(), bond, bond_future, internal, internal_future))
}

pub(crate) fn counter(text: &str) -> ParseResult<Counter> {
    let mut c = Cursor::new(text.trim());
    let name = identifier(&mut c)?;
    c.expect('{')?;
    let inner = c.take_until('}')?;
    if !c.at_end() {
        return Err(c.error("unexpected text after counter"));
    }

    let (test, delta) = match inner.split_once('/') {
        Some((test, delta)) => (test, Some(delta)),
        None => (inner, None),
    };
    let test = if let Some(n) = test.strip_prefix(">=") {
        CounterTest::AtLeast(number(n)?)
    } else if let Some(n) = test.strip_prefix('=') {
        CounterTest::Equal(number(n)?)
    } else {
        return Err(format!("invalid counter test '{test}'"));
    };
    let delta = match delta {
        None => None,
        Some(d) => {
            if let Some(n) = d.strip_prefix("+=") {
                Some(CounterDelta::Increment(number(n)?))
            } else if let Some(n) = d.strip_prefix("-=") {
                Some(CounterDelta::Decrement(number(n)?))
            } else {
                return Err(format!("invalid counter operation '{d}'"));
            }
        }
    };
    Ok(Counter::from_parts(name.to_string(), test, delta))
}

// ============================================================================
// Agents
// ============================================================================

/// Split a signature interior into raw site texts. Commas and whitespace
/// outside `[...]`/`{...}` separate sites.
fn split_sites(interior: &str) -> ParseResult<Vec<&str>> {
    let mut sites = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    for (i, ch) in interior.char_indices() {
        match ch {
            '[' | '{' => {
                depth += 1;
                start.get_or_insert(i);
            }
            ']' | '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced '{ch}' at position {i}"))?;
            }
            c if depth == 0 && (c == ',' || c.is_whitespace()) => {
                if let Some(s) = start.take() {
                    sites.push(&interior[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if depth != 0 {
        return Err("unbalanced brackets in signature".into());
    }
    if let Some(s) = start {
        sites.push(&interior[s..]);
    }
    Ok(sites)
}

pub(crate) fn agent(text: &str) -> ParseResult<Agent> {
    let text = text.trim();
    let open = text.find('(').ok_or("missing '('")?;
    let close = text.rfind(')').ok_or("missing ')'")?;
    if close < open {
        return Err("')' before '('".into());
    }

    let head = &text[..open];
    let (identifier, name) = match head.split_once(':') {
        Some((prefix, name)) => {
            let digits = prefix
                .strip_prefix('x')
                .ok_or_else(|| format!("invalid identifier prefix '{prefix}'"))?;
            (Some(number(digits)?), name)
        }
        None => (None, head),
    };
    if !is_identifier(name) {
        return Err(format!("invalid agent name '{name}'"));
    }

    let change = match &text[close + 1..] {
        "" => None,
        "+" => Some(AbundanceChange::Created),
        "-" => Some(AbundanceChange::Deleted),
        other => return Err(format!("unexpected '{other}' after signature")),
    };

    let interior = &text[open + 1..close];
    if interior.contains(['(', ')']) {
        return Err("nested parentheses in signature".into());
    }
    let mut raw = split_sites(interior)?;
    raw.sort_unstable();

    let mut sites = Vec::with_capacity(raw.len());
    for site in raw {
        sites.push(super::parse_site(site).map_err(|e| e.to_string())?);
    }

    Agent::new(name, sites, identifier, change).map_err(|e| match e {
        Error::AgentParseError { message, .. } => message,
        other => other.to_string(),
    })
}

/// Split an agent list into raw agent texts: each runs from its name to the
/// closing `)` plus an optional `+`/`-` marker.
pub(crate) fn split_agents(text: &str) -> ParseResult<Vec<&str>> {
    let mut agents = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_signature = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '(' if in_signature => return Err(format!("nested '(' at position {i}")),
            '(' => {
                if start.is_none() {
                    return Err(format!("signature without agent name at position {i}"));
                }
                in_signature = true;
            }
            ')' if !in_signature => return Err(format!("unbalanced ')' at position {i}")),
            ')' => {
                in_signature = false;
                let mut end = i + 1;
                if let Some(&(j, marker @ ('+' | '-'))) = chars.peek() {
                    chars.next();
                    end = j + marker.len_utf8();
                }
                let s = start.take().ok_or_else(|| format!("unbalanced ')' at position {i}"))?;
                agents.push(&text[s..end]);
            }
            c if !in_signature && (c == ',' || c.is_whitespace()) => {
                if let Some(s) = start {
                    return Err(format!("agent '{}' has no signature", &text[s..i]));
                }
            }
            _ => {
                if !in_signature {
                    start.get_or_insert(i);
                }
            }
        }
    }

    if in_signature {
        return Err("unterminated signature".into());
    }
    if let Some(s) = start {
        return Err(format!("agent '{}' has no signature", &text[s..]));
    }
    Ok(agents)
}

// ============================================================================
// Bonds and tokens
// ============================================================================

pub(crate) fn bond(text: &str) -> ParseResult<Bond> {
    let text = text.trim();
    let (left, right) = text.split_once("..").ok_or("expected 'Agent.site..site.Agent'")?;
    let (agent_a, site_a) = left.split_once('.').ok_or("expected 'Agent.site' on the left")?;
    let (site_b, agent_b) = right.split_once('.').ok_or("expected 'site.Agent' on the right")?;
    for part in [agent_a, site_a, site_b, agent_b] {
        if !is_identifier(part) {
            return Err(format!("invalid name '{part}'"));
        }
    }
    Ok(Bond::new((agent_a, site_a), (agent_b, site_b)))
}

pub(crate) fn token(text: &str) -> ParseResult<Token> {
    let text = text.trim();
    let (value, name) = text
        .split_once(char::is_whitespace)
        .ok_or("expected 'VALUE NAME'")?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(format!("invalid token name '{name}'"));
    }
    Ok(Token::from_parts(name.to_string(), value.to_string()))
}
