//! Core types and trait definitions for the casefile investigation service.
//!
//! This crate is deliberately free of HTTP, database, and runtime
//! dependencies. It owns the domain model, the storage and collaborator
//! abstractions, and the two pure pieces of the evidence pipeline: the
//! integrity hasher and the risk aggregator.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod analysis;
pub mod audit;
pub mod case;
pub mod collaborator;
pub mod error;
pub mod evidence;
pub mod integrity;
pub mod report;
pub mod store;
pub mod timestamp;

pub use error::{Error, Result};
