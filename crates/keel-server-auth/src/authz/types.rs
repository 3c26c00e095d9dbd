// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Type definitions for access decisions.
//!
//! - [`OperationDescriptor`]: the declared requirements of one operation
//! - [`ResourceSnapshot`]: the fields of a target resource the engine reads
//! - [`ResourceKind`] and [`Action`]: what is being touched and how
//!
//! Descriptors are plain `const` values attached to each operation; nothing is
//! discovered at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::permission::Permission;
use crate::role::Role;
use crate::types::{AuditLogId, OrgId, TaskId, UserId};

/// Types of resources protected by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
	Task,
	User,
	Organization,
	AuditLog,
}

impl ResourceKind {
	pub fn as_str(self) -> &'static str {
		match self {
			ResourceKind::Task => "task",
			ResourceKind::User => "user",
			ResourceKind::Organization => "organization",
			ResourceKind::AuditLog => "audit_log",
		}
	}
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	Create,
	Read,
	List,
	Update,
	Delete,
}

impl Action {
	pub fn is_write(self) -> bool {
		matches!(self, Action::Create | Action::Update | Action::Delete)
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Action::Create => "create",
			Action::Read => "read",
			Action::List => "list",
			Action::Update => "update",
			Action::Delete => "delete",
		};
		f.write_str(s)
	}
}

/// Declared access requirements of one operation.
///
/// Build with the `const` builder methods so descriptors can live in statics:
///
/// ```
/// use keel_server_auth::{Action, OperationDescriptor, Permission, ResourceKind};
///
/// const TASK_DELETE: OperationDescriptor =
/// 	OperationDescriptor::new("task.delete", ResourceKind::Task, Action::Delete)
/// 		.permissions(&[Permission::TaskDelete])
/// 		.resource_scoped();
/// assert!(TASK_DELETE.is_resource_scoped());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
	name: &'static str,
	resource: ResourceKind,
	action: Action,
	roles: &'static [Role],
	permissions: &'static [Permission],
	resource_scoped: bool,
	public: bool,
}

impl OperationDescriptor {
	pub const fn new(name: &'static str, resource: ResourceKind, action: Action) -> Self {
		Self {
			name,
			resource,
			action,
			roles: &[],
			permissions: &[],
			resource_scoped: false,
			public: false,
		}
	}

	/// Accept any principal whose role dominates one of `roles`.
	pub const fn roles(mut self, roles: &'static [Role]) -> Self {
		self.roles = roles;
		self
	}

	/// Require every one of `permissions`.
	pub const fn permissions(mut self, permissions: &'static [Permission]) -> Self {
		self.permissions = permissions;
		self
	}

	/// The operation targets a single resource instance.
	pub const fn resource_scoped(mut self) -> Self {
		self.resource_scoped = true;
		self
	}

	/// The operation may be invoked without an identity.
	pub const fn public(mut self) -> Self {
		self.public = true;
		self
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn resource(&self) -> ResourceKind {
		self.resource
	}

	pub fn action(&self) -> Action {
		self.action
	}

	pub fn required_roles(&self) -> &'static [Role] {
		self.roles
	}

	pub fn required_permissions(&self) -> &'static [Permission] {
		self.permissions
	}

	pub fn is_resource_scoped(&self) -> bool {
		self.resource_scoped
	}

	pub fn is_public(&self) -> bool {
		self.public
	}
}

/// The fields of a resource instance that access decisions depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
	pub kind: ResourceKind,
	pub id: Uuid,
	pub organization_id: OrgId,
	pub created_by_id: Option<UserId>,
	pub assignee_id: Option<UserId>,
}

impl ResourceSnapshot {
	pub fn task(id: TaskId, organization_id: OrgId, created_by_id: UserId) -> Self {
		Self {
			kind: ResourceKind::Task,
			id: id.into_inner(),
			organization_id,
			created_by_id: Some(created_by_id),
			assignee_id: None,
		}
	}

	pub fn user(id: UserId, organization_id: OrgId) -> Self {
		Self {
			kind: ResourceKind::User,
			id: id.into_inner(),
			organization_id,
			created_by_id: None,
			assignee_id: None,
		}
	}

	/// An organization is scoped to itself.
	pub fn organization(id: OrgId) -> Self {
		Self {
			kind: ResourceKind::Organization,
			id: id.into_inner(),
			organization_id: id,
			created_by_id: None,
			assignee_id: None,
		}
	}

	pub fn audit_log(id: AuditLogId, organization_id: OrgId) -> Self {
		Self {
			kind: ResourceKind::AuditLog,
			id: id.into_inner(),
			organization_id,
			created_by_id: None,
			assignee_id: None,
		}
	}

	/// Builder: set the assignee.
	pub fn with_assignee(mut self, assignee_id: UserId) -> Self {
		self.assignee_id = Some(assignee_id);
		self
	}
}
