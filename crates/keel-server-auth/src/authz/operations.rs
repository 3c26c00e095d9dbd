// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access requirements of every API operation.

use super::types::{Action, OperationDescriptor, ResourceKind};
use crate::permission::Permission;
use crate::role::Role;

// =============================================================================
// Tasks
// =============================================================================

pub const TASK_CREATE: OperationDescriptor =
	OperationDescriptor::new("task.create", ResourceKind::Task, Action::Create)
		.permissions(&[Permission::TaskCreate]);

pub const TASK_LIST: OperationDescriptor =
	OperationDescriptor::new("task.list", ResourceKind::Task, Action::List)
		.permissions(&[Permission::TaskRead]);

pub const TASK_STATS: OperationDescriptor =
	OperationDescriptor::new("task.stats", ResourceKind::Task, Action::List)
		.permissions(&[Permission::TaskRead]);

pub const TASK_GET: OperationDescriptor =
	OperationDescriptor::new("task.get", ResourceKind::Task, Action::Read)
		.permissions(&[Permission::TaskRead])
		.resource_scoped();

pub const TASK_REORDER: OperationDescriptor =
	OperationDescriptor::new("task.reorder", ResourceKind::Task, Action::Update)
		.permissions(&[Permission::TaskUpdate])
		.resource_scoped();

pub const TASK_UPDATE: OperationDescriptor =
	OperationDescriptor::new("task.update", ResourceKind::Task, Action::Update)
		.permissions(&[Permission::TaskUpdate])
		.resource_scoped();

pub const TASK_DELETE: OperationDescriptor =
	OperationDescriptor::new("task.delete", ResourceKind::Task, Action::Delete)
		.permissions(&[Permission::TaskDelete])
		.resource_scoped();

// =============================================================================
// Users
// =============================================================================

pub const USER_CREATE: OperationDescriptor =
	OperationDescriptor::new("user.create", ResourceKind::User, Action::Create)
		.roles(&[Role::Owner])
		.permissions(&[Permission::UserCreate]);

pub const USER_LIST: OperationDescriptor =
	OperationDescriptor::new("user.list", ResourceKind::User, Action::List)
		.permissions(&[Permission::UserRead]);

/// The caller's own profile; any authenticated principal.
pub const USER_ME: OperationDescriptor =
	OperationDescriptor::new("user.me", ResourceKind::User, Action::Read);

pub const USER_GET: OperationDescriptor =
	OperationDescriptor::new("user.get", ResourceKind::User, Action::Read)
		.permissions(&[Permission::UserRead]);

pub const USER_UPDATE: OperationDescriptor =
	OperationDescriptor::new("user.update", ResourceKind::User, Action::Update)
		.roles(&[Role::Owner, Role::Admin])
		.permissions(&[Permission::UserUpdate]);

pub const USER_DELETE: OperationDescriptor =
	OperationDescriptor::new("user.delete", ResourceKind::User, Action::Delete)
		.roles(&[Role::Owner])
		.permissions(&[Permission::UserDelete]);

// =============================================================================
// Organizations
// =============================================================================

pub const ORG_CREATE: OperationDescriptor =
	OperationDescriptor::new("org.create", ResourceKind::Organization, Action::Create)
		.roles(&[Role::Owner]);

/// Organization directory shown on the sign-up page.
pub const ORG_LIST: OperationDescriptor =
	OperationDescriptor::new("org.list", ResourceKind::Organization, Action::List).public();

pub const ORG_GET: OperationDescriptor =
	OperationDescriptor::new("org.get", ResourceKind::Organization, Action::Read)
		.permissions(&[Permission::OrgRead]);

pub const ORG_UPDATE: OperationDescriptor =
	OperationDescriptor::new("org.update", ResourceKind::Organization, Action::Update)
		.roles(&[Role::Owner])
		.permissions(&[Permission::OrgUpdate]);

pub const ORG_DELETE: OperationDescriptor =
	OperationDescriptor::new("org.delete", ResourceKind::Organization, Action::Delete)
		.roles(&[Role::Owner]);

// =============================================================================
// Audit log
// =============================================================================

pub const AUDIT_LIST: OperationDescriptor =
	OperationDescriptor::new("audit.list", ResourceKind::AuditLog, Action::List)
		.roles(&[Role::Owner, Role::Admin]);

static ALL: [OperationDescriptor; 19] = [
	TASK_CREATE,
	TASK_LIST,
	TASK_STATS,
	TASK_GET,
	TASK_REORDER,
	TASK_UPDATE,
	TASK_DELETE,
	USER_CREATE,
	USER_LIST,
	USER_ME,
	USER_GET,
	USER_UPDATE,
	USER_DELETE,
	ORG_CREATE,
	ORG_LIST,
	ORG_GET,
	ORG_UPDATE,
	ORG_DELETE,
	AUDIT_LIST,
];

/// Every operation in the catalog.
pub fn all() -> &'static [OperationDescriptor] {
	&ALL
}

/// Looks up an operation by its dotted name, e.g. `task.update`.
pub fn find(name: &str) -> Option<&'static OperationDescriptor> {
	ALL.iter().find(|op| op.name() == name)
}
