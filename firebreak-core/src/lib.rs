//! Shared building blocks for the Goldilock FireBreak Lambda functions.
//!
//! The two Lambdas (`port-status-lambda`, `port-control-lambda`) are thin
//! translation shims between an invocation event and the FireBreak device's
//! HTTPS control API. Everything they share lives here: the per-invocation
//! configuration snapshot, the error taxonomy with its HTTP-style status
//! codes, the physical/API port numbering translation, the authenticated
//! device client and the response envelope returned to the caller.

pub mod client;
pub mod config;
pub mod error;
pub mod port;
pub mod response;
