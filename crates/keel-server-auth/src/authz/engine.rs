// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access decision engine.
//!
//! Evaluates an operation against a principal as a sequence of gates. The
//! first failing gate decides the outcome:
//!
//! 1. **Identity**: non-public operations require a principal
//! 2. **Role gate**: the role must dominate one of the declared roles
//! 3. **Permission gate**: the role must hold every declared permission
//! 4. **Scope gate**: resource-scoped operations only; the resource must sit in
//!    an accessible organization or be assigned to the caller
//! 5. **Ownership**: resource-specific write rules (see [`policies`](super::policies))
//!
//! Evaluation is synchronous and pure. Scope resolution happens before the
//! engine is called and its result is passed in.

use std::sync::Arc;

use tracing::instrument;

use super::decision::{Decision, DenyReason};
use super::policies::task;
use super::types::{OperationDescriptor, ResourceKind, ResourceSnapshot};
use crate::permission::RolePermissionMap;
use crate::principal::Principal;
use crate::scope::AccessibleOrgs;

/// Stateless evaluator over a role → permission table.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
	permissions: Arc<RolePermissionMap>,
}

impl Default for PolicyEngine {
	fn default() -> Self {
		Self::new(RolePermissionMap::standard().clone())
	}
}

impl PolicyEngine {
	pub fn new(permissions: RolePermissionMap) -> Self {
		Self {
			permissions: Arc::new(permissions),
		}
	}

	pub fn permissions(&self) -> &RolePermissionMap {
		&self.permissions
	}

	/// Identity, role and permission gates.
	///
	/// These need no resource and are checked before any lookup.
	pub fn check_operation(&self, principal: Option<&Principal>, op: &OperationDescriptor) -> Decision {
		if op.is_public() {
			return Decision::Allow;
		}

		let Some(principal) = principal else {
			return Decision::Deny(DenyReason::Unauthenticated);
		};

		self.check_role(principal, op)
			.and_then(|| self.check_permissions(principal, op))
	}

	/// Scope gate followed by the ownership rule of the resource's kind.
	pub fn check_resource(
		&self,
		principal: &Principal,
		op: &OperationDescriptor,
		resource: &ResourceSnapshot,
		accessible: &AccessibleOrgs,
	) -> Decision {
		check_scope(principal, resource, accessible)
			.and_then(|| check_ownership(principal, op, resource))
	}

	/// Runs every applicable gate in order.
	///
	/// A resource-scoped operation evaluated without a resource or without an
	/// accessible set is denied at the scope gate.
	#[instrument(
		level = "debug",
		skip(self, principal, resource, accessible),
		fields(
			operation = op.name(),
			user_id = principal.map(|p| tracing::field::display(p.subject_id)),
		)
	)]
	pub fn evaluate(
		&self,
		principal: Option<&Principal>,
		op: &OperationDescriptor,
		resource: Option<&ResourceSnapshot>,
		accessible: Option<&AccessibleOrgs>,
	) -> Decision {
		let decision = self.check_operation(principal, op).and_then(|| {
			if !op.is_resource_scoped() {
				return Decision::Allow;
			}
			match (principal, resource, accessible) {
				(Some(principal), Some(resource), Some(accessible)) => {
					self.check_resource(principal, op, resource, accessible)
				}
				_ => Decision::Deny(DenyReason::ScopeDenied),
			}
		});

		tracing::debug!(%decision, "evaluated operation");
		decision
	}

	fn check_role(&self, principal: &Principal, op: &OperationDescriptor) -> Decision {
		let required = op.required_roles();
		if required.is_empty() {
			return Decision::Allow;
		}
		Decision::require(principal.role.dominates_any(required), DenyReason::RoleDenied)
	}

	fn check_permissions(&self, principal: &Principal, op: &OperationDescriptor) -> Decision {
		Decision::require(
			self
				.permissions
				.has_all_permissions(principal.role, op.required_permissions()),
			DenyReason::PermissionDenied,
		)
	}
}

fn check_scope(principal: &Principal, resource: &ResourceSnapshot, accessible: &AccessibleOrgs) -> Decision {
	let in_scope = accessible.contains(resource.organization_id);
	let assigned = resource.assignee_id == Some(principal.subject_id);
	Decision::require(in_scope || assigned, DenyReason::ScopeDenied)
}

fn check_ownership(
	principal: &Principal,
	op: &OperationDescriptor,
	resource: &ResourceSnapshot,
) -> Decision {
	match resource.kind {
		ResourceKind::Task => task::evaluate_ownership(principal, op.action(), resource),
		ResourceKind::User | ResourceKind::Organization | ResourceKind::AuditLog => Decision::Allow,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::authz::operations::*;
	use crate::{OrgId, Permission, Role, TaskId, UserId};

	struct World {
		parent: OrgId,
		child: OrgId,
		sibling: OrgId,
	}

	impl World {
		fn new() -> Self {
			Self {
				parent: OrgId::generate(),
				child: OrgId::generate(),
				sibling: OrgId::generate(),
			}
		}

		/// Scope of a principal homed at `home` under parent ─┬─ child
		///                                                    └─ sibling
		fn accessible(&self, home: OrgId) -> AccessibleOrgs {
			if home == self.parent {
				AccessibleOrgs::from_ids(home, [self.child, self.sibling])
			} else {
				AccessibleOrgs::home_only(home)
			}
		}
	}

	fn principal(role: Role, org: OrgId) -> Principal {
		Principal::new(UserId::generate(), "user@example.com", role, org)
	}

	fn engine() -> PolicyEngine {
		PolicyEngine::default()
	}

	fn eval(
		engine: &PolicyEngine,
		world: &World,
		p: &Principal,
		op: &OperationDescriptor,
		task: &ResourceSnapshot,
	) -> Decision {
		let accessible = world.accessible(p.organization_id);
		engine.evaluate(Some(p), op, Some(task), Some(&accessible))
	}

	mod identity {
		use super::*;

		#[test]
		fn missing_identity_is_unauthenticated() {
			let d = engine().evaluate(None, &TASK_LIST, None, None);
			assert_eq!(d, Decision::Deny(DenyReason::Unauthenticated));
		}

		#[test]
		fn operation_without_requirements_still_needs_identity() {
			let d = engine().evaluate(None, &USER_ME, None, None);
			assert_eq!(d, Decision::Deny(DenyReason::Unauthenticated));
		}

		#[test]
		fn public_operation_allows_anonymous() {
			assert!(engine().evaluate(None, &ORG_LIST, None, None).is_allowed());
		}

		#[test]
		fn authenticated_without_requirements_passes() {
			let p = principal(Role::Viewer, OrgId::generate());
			assert!(engine().evaluate(Some(&p), &USER_ME, None, None).is_allowed());
		}
	}

	mod coarse_gates {
		use super::*;

		#[test]
		fn viewer_create_denied_at_permission_gate() {
			let p = principal(Role::Viewer, OrgId::generate());
			let d = engine().evaluate(Some(&p), &TASK_CREATE, None, None);
			assert_eq!(d, Decision::Deny(DenyReason::PermissionDenied));
		}

		#[test]
		fn admin_may_create_tasks() {
			let p = principal(Role::Admin, OrgId::generate());
			assert!(engine().evaluate(Some(&p), &TASK_CREATE, None, None).is_allowed());
		}

		#[test]
		fn role_gate_runs_before_permission_gate() {
			let p = principal(Role::Viewer, OrgId::generate());
			let d = engine().evaluate(Some(&p), &USER_CREATE, None, None);
			assert_eq!(d, Decision::Deny(DenyReason::RoleDenied));
		}

		#[test]
		fn role_gate_uses_dominance() {
			let owner = principal(Role::Owner, OrgId::generate());
			let admin = principal(Role::Admin, OrgId::generate());
			let viewer = principal(Role::Viewer, OrgId::generate());
			assert!(engine().evaluate(Some(&owner), &AUDIT_LIST, None, None).is_allowed());
			assert!(engine().evaluate(Some(&admin), &AUDIT_LIST, None, None).is_allowed());
			assert_eq!(
				engine().evaluate(Some(&viewer), &AUDIT_LIST, None, None),
				Decision::Deny(DenyReason::RoleDenied)
			);
		}

		#[test]
		fn admin_passes_role_gate_but_lacks_user_update_grant() {
			// user.update admits admins by role; the standard table does not grant them user:update
			let admin = principal(Role::Admin, OrgId::generate());
			assert_eq!(
				engine().evaluate(Some(&admin), &USER_UPDATE, None, None),
				Decision::Deny(DenyReason::PermissionDenied)
			);
		}

		#[test]
		fn custom_table_changes_permission_outcome() {
			let map = RolePermissionMap::builder()
				.grant(Role::Viewer, [Permission::TaskCreate])
				.build();
			let engine = PolicyEngine::new(map);
			let p = principal(Role::Viewer, OrgId::generate());
			assert!(engine.evaluate(Some(&p), &TASK_CREATE, None, None).is_allowed());
			assert_eq!(
				engine.evaluate(Some(&p), &TASK_LIST, None, None),
				Decision::Deny(DenyReason::PermissionDenied)
			);
		}
	}

	mod scope {
		use super::*;

		#[test]
		fn parent_admin_reads_child_task() {
			let w = World::new();
			let admin = principal(Role::Admin, w.parent);
			let task = ResourceSnapshot::task(TaskId::generate(), w.child, UserId::generate());
			assert!(eval(&engine(), &w, &admin, &TASK_GET, &task).is_allowed());
		}

		#[test]
		fn child_viewer_cannot_read_parent_task() {
			let w = World::new();
			let viewer = principal(Role::Viewer, w.child);
			let task = ResourceSnapshot::task(TaskId::generate(), w.parent, UserId::generate());
			assert_eq!(
				eval(&engine(), &w, &viewer, &TASK_GET, &task),
				Decision::Deny(DenyReason::ScopeDenied)
			);
		}

		#[test]
		fn child_viewer_cannot_read_sibling_task() {
			let w = World::new();
			let viewer = principal(Role::Viewer, w.child);
			let task = ResourceSnapshot::task(TaskId::generate(), w.sibling, UserId::generate());
			assert_eq!(
				eval(&engine(), &w, &viewer, &TASK_GET, &task),
				Decision::Deny(DenyReason::ScopeDenied)
			);
		}

		#[test]
		fn assignment_bypasses_org_scope() {
			let w = World::new();
			let viewer = principal(Role::Viewer, w.child);
			let task = ResourceSnapshot::task(TaskId::generate(), w.parent, UserId::generate())
				.with_assignee(viewer.subject_id);
			assert!(eval(&engine(), &w, &viewer, &TASK_GET, &task).is_allowed());
		}

		#[test]
		fn scoped_operation_without_resource_is_denied() {
			let p = principal(Role::Owner, OrgId::generate());
			let d = engine().evaluate(Some(&p), &TASK_GET, None, None);
			assert_eq!(d, Decision::Deny(DenyReason::ScopeDenied));
		}

		#[test]
		fn permission_gate_runs_before_scope_gate() {
			let w = World::new();
			let map = RolePermissionMap::builder().build();
			let engine = PolicyEngine::new(map);
			let viewer = principal(Role::Viewer, w.child);
			let task = ResourceSnapshot::task(TaskId::generate(), w.parent, UserId::generate());
			assert_eq!(
				eval(&engine, &w, &viewer, &TASK_GET, &task),
				Decision::Deny(DenyReason::PermissionDenied)
			);
		}
	}

	mod ownership {
		use super::*;

		#[test]
		fn viewer_cannot_update_task_created_by_someone_else() {
			let w = World::new();
			let viewer = principal(Role::Viewer, w.parent);
			let task = ResourceSnapshot::task(TaskId::generate(), w.parent, UserId::generate());
			// viewers lack task:update in the standard table
			assert_eq!(
				eval(&engine(), &w, &viewer, &TASK_UPDATE, &task),
				Decision::Deny(DenyReason::PermissionDenied)
			);
		}

		#[test]
		fn creator_without_admin_rank_may_update_own_task() {
			let w = World::new();
			let map = RolePermissionMap::builder()
				.grant(Role::Viewer, [Permission::TaskRead, Permission::TaskUpdate])
				.build();
			let engine = PolicyEngine::new(map);
			let viewer = principal(Role::Viewer, w.parent);
			let own = ResourceSnapshot::task(TaskId::generate(), w.parent, viewer.subject_id);
			let other = ResourceSnapshot::task(TaskId::generate(), w.parent, UserId::generate());

			assert!(eval(&engine, &w, &viewer, &TASK_UPDATE, &own).is_allowed());
			assert_eq!(
				eval(&engine, &w, &viewer, &TASK_UPDATE, &other),
				Decision::Deny(DenyReason::OwnershipDenied)
			);
		}

		#[test]
		fn admin_updates_any_task_in_scope() {
			let w = World::new();
			let admin = principal(Role::Admin, w.parent);
			let task = ResourceSnapshot::task(TaskId::generate(), w.child, UserId::generate());
			assert!(eval(&engine(), &w, &admin, &TASK_UPDATE, &task).is_allowed());
			assert!(eval(&engine(), &w, &admin, &TASK_REORDER, &task).is_allowed());
		}

		#[test]
		fn creator_cannot_delete_without_admin_rank() {
			let w = World::new();
			let map = RolePermissionMap::builder()
				.grant(Role::Viewer, [Permission::TaskDelete])
				.build();
			let engine = PolicyEngine::new(map);
			let viewer = principal(Role::Viewer, w.parent);
			let own = ResourceSnapshot::task(TaskId::generate(), w.parent, viewer.subject_id);
			assert_eq!(
				eval(&engine, &w, &viewer, &TASK_DELETE, &own),
				Decision::Deny(DenyReason::OwnershipDenied)
			);
		}

		#[test]
		fn owner_deletes_task_in_child_org() {
			let w = World::new();
			let owner = principal(Role::Owner, w.parent);
			let task = ResourceSnapshot::task(TaskId::generate(), w.child, UserId::generate());
			assert!(eval(&engine(), &w, &owner, &TASK_DELETE, &task).is_allowed());
		}

		#[test]
		fn scope_denial_precedes_ownership() {
			let w = World::new();
			let admin = principal(Role::Admin, w.child);
			let task = ResourceSnapshot::task(TaskId::generate(), w.parent, admin.subject_id);
			assert_eq!(
				eval(&engine(), &w, &admin, &TASK_DELETE, &task),
				Decision::Deny(DenyReason::ScopeDenied)
			);
		}
	}

	mod properties {
		use super::*;
		use proptest::prelude::*;

		fn arb_role() -> impl Strategy<Value = Role> {
			prop_oneof![Just(Role::Owner), Just(Role::Admin), Just(Role::Viewer)]
		}

		fn arb_op() -> impl Strategy<Value = &'static OperationDescriptor> {
			(0..all().len()).prop_map(|i| &all()[i])
		}

		proptest! {
			#[test]
			fn evaluation_is_idempotent(
				role in arb_role(),
				op in arb_op(),
				in_scope in any::<bool>(),
				is_creator in any::<bool>(),
			) {
				let w = World::new();
				let p = principal(role, w.parent);
				let org = if in_scope { w.child } else { OrgId::generate() };
				let creator = if is_creator { p.subject_id } else { UserId::generate() };
				let task = ResourceSnapshot::task(TaskId::generate(), org, creator);
				let engine = engine();

				let first = eval(&engine, &w, &p, op, &task);
				let second = eval(&engine, &w, &p, op, &task);
				prop_assert_eq!(first, second);
			}

			#[test]
			fn owner_is_never_denied_in_scope(op in arb_op()) {
				let w = World::new();
				let owner = principal(Role::Owner, w.parent);
				let task = ResourceSnapshot::task(TaskId::generate(), w.child, UserId::generate());
				prop_assert!(eval(&engine(), &w, &owner, op, &task).is_allowed());
			}

			#[test]
			fn higher_role_allowed_wherever_lower_role_is(op in arb_op()) {
				let w = World::new();
				let viewer = principal(Role::Viewer, w.parent);
				let admin = principal(Role::Admin, w.parent);
				let task = ResourceSnapshot::task(TaskId::generate(), w.parent, UserId::generate());
				if eval(&engine(), &w, &viewer, op, &task).is_allowed() {
					prop_assert!(eval(&engine(), &w, &admin, op, &task).is_allowed());
				}
			}
		}
	}
}
