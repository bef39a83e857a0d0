//! Line-based reader for KaSim snapshot files.
//!
//! ```text
//! // Snapshot [Event: 48200]
//! // "uuid" : "a1b2c3"
//! %def: "T0" "100.5"
//!
//! %init: 3 /*2 agents*/ A(x[1]), B(x[1])
//! %init: 1.5e3 atp
//! ```
//!
//! The three header fields may also arrive on a single line. The uuid is optional.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use super::Snapshot;
use crate::kappa;
use crate::model::{Complex, KappaExpression};
use crate::{Error, Result};

type ParseResult<T> = std::result::Result<T, String>;

/// One `%init:` line of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEntry {
    /// `ABUNDANCE /*SIZE agents*/ COMPLEX`
    Species { complex: Complex, abundance: u64 },
    /// `VALUE NAME`
    Token { name: String, value: f64 },
}

/// Parse a single entry line, with or without its `%init:` prefix.
pub fn parse_entry(line: &str) -> Result<SnapshotEntry> {
    let line = line.trim();
    let body = line.strip_prefix("%init:").unwrap_or(line);
    entry(body.trim()).map_err(|message| Error::SnapshotParseError { line: 1, message })
}

fn entry(text: &str) -> ParseResult<SnapshotEntry> {
    let (first, rest) = text
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("expected 'ABUNDANCE /*N agents*/ COMPLEX' or 'VALUE TOKEN', got '{text}'"))?;
    let rest = rest.trim_start();

    let Some(comment) = rest.strip_prefix("/*") else {
        let token = kappa::parse_token(text).map_err(|e| e.to_string())?;
        let value = token.numeric_value().ok_or_else(|| {
            format!("token '{}' has non-numeric value '{}'", token.name(), token.value())
        })?;
        return Ok(SnapshotEntry::Token { name: token.name().to_string(), value });
    };

    let abundance: u64 = first
        .parse()
        .map_err(|_| format!("invalid abundance '{first}'"))?;
    let (declared, expr) = comment.split_once("*/").ok_or("unterminated agent count comment")?;
    let declared = declared.trim();
    let count = declared
        .strip_suffix("agents")
        .or_else(|| declared.strip_suffix("agent"))
        .ok_or_else(|| format!("expected 'N agents', got '{declared}'"))?
        .trim();
    let size: usize = count
        .parse()
        .map_err(|_| format!("invalid agent count '{count}'"))?;

    let complex = kappa::parse_complex(expr.trim()).map_err(|e| e.to_string())?;
    if complex.size() != size {
        return Err(format!(
            "declared {size} agents but '{}' has {}",
            complex.canonical_string(),
            complex.size()
        ));
    }
    if !complex.is_connected().map_err(|e| e.to_string())? {
        return Err(format!("species '{}' is not connected", complex.canonical_string()));
    }
    Ok(SnapshotEntry::Species { complex, abundance })
}

// ============================================================================
// Header
// ============================================================================

#[derive(Debug, Default)]
struct Header {
    event: Option<u64>,
    uuid: Option<String>,
    time: Option<f64>,
}

const EVENT_MARKER: &str = "// Snapshot [Event:";
const UUID_MARKER: &str = "\"uuid\"";
const DEF_MARKER: &str = "%def:";

/// `"content"` at the start of `s`; returns the content and what follows.
fn quoted(s: &str) -> ParseResult<(&str, &str)> {
    let inner = s
        .strip_prefix('"')
        .ok_or_else(|| format!("expected a quoted string at '{s}'"))?;
    let end = inner.find('"').ok_or("unterminated string")?;
    Ok((&inner[..end], &inner[end + 1..]))
}

/// Pick up any header fields present on `line`. Returns false if it has none.
fn header_fields(line: &str, header: &mut Header) -> ParseResult<bool> {
    let mut matched = false;

    if let Some(pos) = line.find(EVENT_MARKER) {
        let rest = &line[pos + EVENT_MARKER.len()..];
        let end = rest.find(']').ok_or("unterminated event marker")?;
        let number = rest[..end].trim();
        header.event = Some(
            number
                .parse()
                .map_err(|_| format!("invalid event number '{number}'"))?,
        );
        matched = true;
    }

    if let Some(pos) = line.find(UUID_MARKER) {
        let rest = line[pos + UUID_MARKER.len()..].trim_start();
        let rest = rest
            .strip_prefix(':')
            .ok_or("expected ':' after \"uuid\"")?
            .trim_start();
        let (uuid, _) = quoted(rest)?;
        header.uuid = Some(uuid.to_string());
        matched = true;
    }

    if let Some(pos) = line.find(DEF_MARKER) {
        let rest = line[pos + DEF_MARKER.len()..].trim_start();
        let (name, rest) = quoted(rest)?;
        if name != "T0" {
            return Err(format!("unexpected definition '{name}' in snapshot header"));
        }
        let (time, _) = quoted(rest.trim_start())?;
        header.time = Some(
            time.parse()
                .map_err(|_| format!("invalid sample time '{time}'"))?,
        );
        matched = true;
    }

    Ok(matched)
}

// ============================================================================
// Whole file
// ============================================================================

pub(crate) fn parse(text: &str) -> Result<Snapshot> {
    let mut header = Header::default();
    let mut complexes: BTreeMap<Complex, u64> = BTreeMap::new();
    let mut tokens: BTreeMap<String, f64> = BTreeMap::new();
    let mut last_line = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let fail = |message: String| Error::SnapshotParseError { line: line_no, message };
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(body) = line.strip_prefix("%init:") {
            if header.event.is_none() || header.time.is_none() {
                return Err(fail("entry before snapshot header".into()));
            }
            match entry(body.trim()).map_err(fail)? {
                SnapshotEntry::Species { complex, abundance } => {
                    if let Some(existing) = complexes.get_mut(&complex) {
                        warn!(line = line_no, species = %complex, "duplicate species line merged");
                        *existing += abundance;
                    } else {
                        complexes.insert(complex, abundance);
                    }
                }
                SnapshotEntry::Token { name, value } => {
                    if tokens.insert(name.clone(), value).is_some() {
                        warn!(line = line_no, token = %name, "duplicate token line, keeping the last value");
                    }
                }
            }
            continue;
        }

        if header_fields(line, &mut header).map_err(fail)? {
            continue;
        }
        if line.starts_with("//") {
            trace!(line = line_no, "comment skipped");
            continue;
        }
        return Err(fail(format!("unrecognized line '{line}'")));
    }

    let missing = |field: &str| Error::SnapshotParseError {
        line: last_line,
        message: format!("snapshot header has no {field}"),
    };
    let event = header.event.ok_or_else(|| missing("event number"))?;
    let time = header.time.ok_or_else(|| missing("sample time"))?;

    debug!(
        event,
        time,
        species = complexes.len(),
        tokens = tokens.len(),
        "snapshot parsed"
    );
    Ok(Snapshot {
        event,
        uuid: header.uuid,
        time,
        complexes,
        tokens,
    })
}
