//! Value objects exchanged with the external store.
//!
//! # Responsibility
//! - Define the goal/task/time-block shapes this engine consumes and produces.
//! - Keep wire naming stable (`snake_case`) for store round-trips.
//!
//! # Invariants
//! - Durable ownership of every entity belongs to the caller's store; the
//!   engine only derives proposals from them.
//! - Generated entities receive fresh v4 `EntityId`s.

pub mod goal;
pub mod plan;
pub mod task;

use uuid::Uuid;

/// Stable identifier for goals, key results, milestones, tasks and blocks.
pub type EntityId = Uuid;
