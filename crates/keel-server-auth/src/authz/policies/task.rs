// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task write policies.
//!
//! - Update: admins and owners may update any task in scope; everyone else only
//!   the tasks they created.
//! - Delete: admins and owners only. Creating a task does not grant the right
//!   to delete it.
//! - Read, list and create carry no ownership rule.

use crate::authz::{Action, Decision, DenyReason, ResourceSnapshot};
use crate::principal::Principal;

/// Evaluates the ownership rule for `action` on a task.
pub fn evaluate_ownership(principal: &Principal, action: Action, task: &ResourceSnapshot) -> Decision {
	match action {
		Action::Update => {
			let is_creator = task.created_by_id == Some(principal.subject_id);
			Decision::require(principal.is_admin() || is_creator, DenyReason::OwnershipDenied)
		}
		Action::Delete => Decision::require(principal.is_admin(), DenyReason::OwnershipDenied),
		Action::Create | Action::Read | Action::List => Decision::Allow,
	}
}
