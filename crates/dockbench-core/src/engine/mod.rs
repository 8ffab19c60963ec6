//! # Engine Module
//!
//! This module implements the scheduling engine that drives a batch of
//! HADDOCK runs from fully pending to fully terminal.
//!
//! ## Overview
//!
//! The engine owns the non-trivial state in dockbench: each run is a [`job::Job`]
//! with a monotonic state machine, and the [`queue::Queue`] repeatedly polls,
//! submits, and retires jobs while never exceeding the configured number of
//! concurrently live external processes. Concurrency is achieved purely by
//! keeping multiple child processes alive at once; the control flow itself is
//! a single cooperative polling loop.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Queue tunables: concurrency cap, polling
//!   cadence, and the job submission order.
//! - **Jobs** ([`job`]) - The per-run state machine and its success
//!   classification based on HADDOCK's completion-marker file.
//! - **Process Launching** ([`runner`]) - The seam between the queue and the
//!   operating system; tests substitute a scripted implementation.
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting of
//!   queue events for user feedback.
//! - **Error Handling** ([`error`]) - Engine-specific error types.

pub mod config;
pub mod error;
pub mod job;
pub mod progress;
pub mod queue;
pub mod runner;
