//! Report generation for casefile.
//!
//! Two independent steps:
//!
//! 1. [`render`] turns a case into a canonical plain-text report document.
//! 2. [`seal`] encrypts that document under a password-derived key and binds
//!    it to the case's evidence hash; [`open`] reverses it, authenticating
//!    before any plaintext is produced.

mod render;
mod seal;

pub mod error;

pub use error::{Error, Result};
pub use render::{ReportInput, render};
pub use seal::{ENVELOPE_VERSION, open, seal};
