//! # kappa-rs — Kappa Model Analysis in Rust
//!
//! Parses Kappa expressions into canonical values, projects complexes onto
//! site graphs, counts pattern embeddings, and aggregates simulation snapshots.
//!
//! ## Design Principles
//!
//! 1. **Canonical identity**: every entity is equal, ordered and hashed by its canonical text
//! 2. **Parser owns nothing**: Kappa text → value is a pure function
//! 3. **Graphs are projections**: complexes stay the source of truth, graphs are derived
//! 4. **Snapshots are immutable**: parsed once, queried many times
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kappa_rs::{Complex, Snapshot};
//!
//! # fn example() -> kappa_rs::Result<()> {
//! let snapshot = Snapshot::from_path("snap_100.ka")?;
//! println!("{} agents in {} species", snapshot.total_mass(), snapshot.species_count());
//!
//! let dimer: Complex = "A(x[1]), B(x[1])".parse()?;
//! println!("{} dimers", snapshot.abundance_of_pattern(&dimer)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `parallel` | yes | Fan pattern counting out over complexes with rayon |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod kappa;
pub mod graph;
pub mod snapshot;
pub mod config;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    AbundanceChange, Agent, Bond, BondState, Complex, Counter, CounterDelta, CounterTest,
    InternalState, KappaExpression, Port, Site, Token,
};

// ============================================================================
// Re-exports: Parsing, Graph, Snapshot
// ============================================================================

pub use kappa::{
    parse_agent, parse_bond, parse_complex, parse_counter, parse_expression, parse_port,
    parse_site, parse_token, KappaEntity,
};
pub use graph::{embed, BondEdge, Embedding, MoleculeGraph, NetMap, Terminus};
pub use snapshot::{parse_entry, Snapshot, SnapshotEntry, SnapshotSummary};
pub use config::EngineConfig;
pub use export::{snapshot_to_string, write_snapshot};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Port parse error in '{text}': {message}")]
    PortParseError { text: String, message: String },

    #[error("Counter parse error in '{text}': {message}")]
    CounterParseError { text: String, message: String },

    #[error("Agent parse error in '{text}': {message}")]
    AgentParseError { text: String, message: String },

    #[error("Complex parse error in '{text}': {message}")]
    ComplexParseError { text: String, message: String },

    #[error("Token parse error in '{text}': {message}")]
    TokenParseError { text: String, message: String },

    #[error("Bond parse error in '{text}': {message}")]
    BondParseError { text: String, message: String },

    #[error("Snapshot parse error at line {line}: {message}")]
    SnapshotParseError { line: usize, message: String },

    #[error("Cannot compare {left} with {right}")]
    EqualityError { left: &'static str, right: &'static str },

    #[error("Undefined satisfaction: {0}")]
    UndefinedSatisfaction(String),

    #[error("Disconnected graph: {0}")]
    DisconnectedGraph(String),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
