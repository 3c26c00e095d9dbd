// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access decisions.
//!
//! Every operation declares its requirements as an [`OperationDescriptor`]
//! (see [`operations`]). The [`PolicyEngine`] checks a principal against a
//! descriptor and, for resource-scoped operations, a [`ResourceSnapshot`] plus
//! the principal's accessible organizations.

pub mod decision;
pub mod engine;
pub mod operations;
pub mod policies;
pub mod types;

pub use decision::{Decision, DenyReason};
pub use engine::PolicyEngine;
pub use types::{Action, OperationDescriptor, ResourceKind, ResourceSnapshot};
