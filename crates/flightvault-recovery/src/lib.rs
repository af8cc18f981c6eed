//! # flightvault-recovery
//!
//! Diff Engine, Health Scorer, Smart Restore-Point Finder, Classifier and
//! Selective Executor, wired together behind the `RecoveryEngine` facade.
//! Depends on `flightvault-core` for shared types and `flightvault-graph`
//! for the Dependency Validator; talks to the store only through the
//! `TemporalStore` trait, never a concrete implementation.

mod cancellation;
pub mod classify;
pub mod diff;
mod engine;
pub mod executor;
pub mod finder;
pub mod health;

pub use cancellation::CancellationToken;
pub use engine::RecoveryEngine;
