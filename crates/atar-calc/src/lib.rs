//! Queensland ATAR estimation.
//!
//! Raw subject results are scaled through per-subject curves, aggregated into a
//! Tertiary Entrance (TE) score and mapped onto an ATAR. The [`scoring`] module holds
//! the pure pipeline; [`cohort`] runs it across many students and produces the views
//! consumed by the CLI and HTTP service.

pub mod cohort;
pub mod config;
pub mod error;
pub mod format;
pub mod scoring;
pub mod telemetry;
