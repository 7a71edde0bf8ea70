//! Bastion Testing Infrastructure
//!
//! Shared fixtures and proptest strategies for the integration tests of the
//! Bastion crates.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! bastion-testkit = { path = "../bastion-testkit" }
//! ```
//!
//! Unit tests inside `bastion-authorization` must not use this crate: its
//! types come from a separate build of that crate. Use it from `tests/`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod strategies;

pub use fixtures::*;
