//! Side-effecting helpers: snapshot files, configuration, seed files, export.

pub mod config;
pub mod export;
pub mod seed;
pub mod snapshot;
