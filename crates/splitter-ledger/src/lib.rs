//! # splitter-ledger: weighted proportional distribution.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! Two strategies share the same share calculator:
//! - **Pull ledger** ([`PullLedger`]): incoming funds are reconciled into a
//!   running `total_deposited`; each membership claims
//!   `share(weight, total_weight, total_deposited) - claimed` at any time,
//!   in any order, never twice.
//! - **Push distributor** ([`PushDistributor`]): a specific amount is split
//!   and paid to every current owner in one atomic pass, with no per-member
//!   state.
//!
//! [`Splitter`] selects one of them at construction time from a
//! [`SplitConfig`].

pub mod config;
pub mod pull;
pub mod push;
pub mod shared;
pub mod state;
pub mod strategy;

pub use config::{ConfigError, DistributionMode, MemberConfig, SplitConfig};
pub use pull::PullLedger;
pub use push::{DistributionReport, PushDistributor};
pub use shared::SharedSplitter;
pub use state::LedgerState;
pub use strategy::{Distribution, Splitter};
