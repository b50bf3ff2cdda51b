//! The case lifecycle controller.
//!
//! [`CaseController`] is the only component that mutates cases. It sequences
//! evidence collection, analysis, and report generation, enforces their
//! preconditions, serialises mutating work per case, and records an audit
//! event for every state change.

mod controller;
mod locks;

pub mod config;
pub mod error;

pub use config::ControllerConfig;
pub use controller::CaseController;
pub use error::{Error, ErrorKind, Result};
pub use locks::CaseLocks;
