//! # Improv Data
//!
//! The foundation crate for Improv - records, dotted paths, the deep-merge rule,
//! engine options and the contracts of the host that Improv plugs into.
//! This crate holds no engine state and makes no merge-order decisions.

pub mod config;
pub mod error;
pub mod host;
pub mod record;

pub use config::*;
pub use error::*;
pub use host::*;
pub use record::*;
