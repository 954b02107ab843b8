//! Cross-crate test suite for Splitter.
//!
//! Integration tests under `tests/` drive the pull ledger and push
//! distributor end to end over the in-memory registry and bank, and check
//! the accounting invariants under randomized operation sequences.

pub mod helpers;
