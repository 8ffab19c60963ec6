//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::core`] and [`crate::engine`]
//! layers together into complete procedures.
//!
//! - **Benchmark Workflow** ([`bench`]) - Validates the HADDOCK installation
//!   and the dataset, prepares one run per (target × scenario), drives every
//!   run through the polling queue, and reports per-job outcomes.

pub mod bench;
