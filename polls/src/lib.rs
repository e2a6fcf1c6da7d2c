//! Classroom live polls.
//!
//! Instructors define multiple-choice polls, students vote through a shared
//! link, and results are tallied live. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure logic (validation, tallying, identifiers). No I/O.
//! - **[`store`]**: In-memory poll and response stores.
//! - **[`io`]**: Snapshot persistence, configuration, seed files, CSV export.
//!
//! [`service::PollService`] ties them together and is the only place state
//! is mutated.

pub mod app;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
