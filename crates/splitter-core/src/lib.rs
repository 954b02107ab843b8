//! # splitter-core
//! Foundation types, share arithmetic and collaborator traits for Splitter.

pub mod bank;
pub mod constants;
pub mod error;
pub mod events;
pub mod math;
pub mod registry;
pub mod traits;
pub mod types;
