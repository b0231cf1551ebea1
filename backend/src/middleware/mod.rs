//! Actix middleware shared by every scope.
//!
//! [`Trace`] assigns each request a trace id, echoes it in the
//! `trace-id` response header, and scopes it over the handler future so
//! domain errors and spawned chat streams carry the same id.

pub mod trace;

pub use trace::Trace;
