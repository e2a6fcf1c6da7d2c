//! Pure poll logic: validation, tallying, identifiers.
//!
//! Nothing here performs I/O or reads the clock.

pub mod ids;
pub mod tally;
pub mod validate;
