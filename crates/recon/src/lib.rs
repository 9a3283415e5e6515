//! `fleetmatch-recon`: two-ledger vehicle transaction matching engine.
//!
//! Pure engine crate: receives CSV text and typed records, returns candidate
//! pairs, counts and the flagged ledger A. No file system access.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod matcher;
pub mod model;
pub mod normalize;

pub use config::ReconConfig;
pub use engine::{run, RunOptions};
pub use error::ReconError;
pub use model::{Ledger, LedgerSide, MatchCandidate, MatchTolerance, ReconInput, ReconResult, Transaction};
