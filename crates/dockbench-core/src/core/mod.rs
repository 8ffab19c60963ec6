//! # Core Module
//!
//! The foundation layer of dockbench: stateless I/O and text processing
//! around a HADDOCK installation and a benchmark dataset.
//!
//! - **Dataset handling** ([`dataset`]) - Target discovery, receptor/ligand
//!   input validation, and per-scenario run preparation (`run.param`
//!   generation, ensemble lists, toppar copying).
//! - **CNS files** ([`cns`]) - Parameter extraction from `run.cns-conf` and
//!   override rewriting of a run's `run.cns`.
//! - **HADDOCK wrapper** ([`haddock`]) - Locating the installed executable,
//!   probing that it can run at all, and driving its setup phase.
//! - **Scenarios** ([`scenario`]) - The named parameter-override sets a
//!   benchmark applies on top of each dataset target.

pub mod cns;
pub mod dataset;
pub mod haddock;
pub mod scenario;
