//! Core library for the site-problem-sync command line application.
//!
//! The internal site-problem tracker and the customer's tracker describe the
//! same tickets. The library reconciles the two: customer values are
//! propagated into the internal tracker according to a declarative field
//! mapping, and protected internal rows missing from the customer tracker are
//! flagged. The reconciliation itself lives in [`reconcile`] and only deals
//! with in-memory [`model::Table`]s; workbook adapters live under [`io`] and
//! the end-to-end runs under [`sync`].

pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod sync;

pub use config::{FieldMapping, FieldRule, ReconcileConfig, UpdateMode};
pub use error::{Result, ToolError};
pub use model::Table;
pub use reconcile::{ReconcileOutcome, Reconciler, reconcile};
