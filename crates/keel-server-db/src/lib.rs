// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Keel.
//!
//! Repositories own a [`sqlx::SqlitePool`] and store IDs and timestamps as
//! text. [`OrgRepository`] doubles as the organization hierarchy for scope
//! resolution and [`SqliteResourceLookup`] feeds resource snapshots to the
//! authorizer.

pub mod audit;
mod convert;
pub mod error;
pub mod lookup;
pub mod org;
pub mod pool;
pub mod task;
pub mod user;

#[cfg(test)]
pub mod testing;

pub use audit::SqliteAuditRecorder;
pub use error::{DbError, Result};
pub use lookup::SqliteResourceLookup;
pub use org::{OrgRepository, OrgStore};
pub use pool::{create_pool, run_migrations};
pub use task::{
	NewTask, ParseTaskFieldError, Task, TaskCategory, TaskFilter, TaskPriority, TaskRepository,
	TaskSortField, TaskStats, TaskStatus, TaskStore, TaskUpdate,
};
pub use user::{NewUser, User, UserRepository, UserStore};
