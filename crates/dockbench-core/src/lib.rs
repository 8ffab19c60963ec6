//! # dockbench Core Library
//!
//! A batch execution engine for HADDOCK docking benchmarks: it prepares one
//! run directory per (dataset target × scenario) pair and drives every
//! prepared run to completion through a fixed-concurrency polling queue.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Stateless I/O and text processing: dataset
//!   discovery and validation, `run.param` generation, CNS parameter-file
//!   editing, and the wrapper around the external HADDOCK installation.
//!
//! - **[`engine`]: The Logic Core.** The stateful scheduling layer: the job
//!   state machine, the process-launching seam ([`engine::runner`]), and the
//!   polling queue that enforces the concurrency cap.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties `core` and `engine` together to execute a complete benchmark and
//!   report per-job outcomes. It provides a simple and powerful entry point
//!   for end-users of the library.

pub mod core;
pub mod engine;
pub mod workflows;
