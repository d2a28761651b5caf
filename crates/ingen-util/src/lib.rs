//! ingen-util - Shared utilities for the ingen code generator.
//!
//! This crate holds the pieces every pipeline stage needs: source spans
//! for location tracking and the error types that flow from the lexers,
//! the inspect parser and the template evaluator up to the driver.
//!
//! Every fallible stage returns [`Result`]; the first error aborts the
//! stage and the driver prints it once. Errors render as
//! `file:line:column: message`.

pub mod error;
pub mod span;

pub use error::{Error, ErrorKind, Result};
pub use span::Span;
