// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Atomic capabilities and the role → capability matrix.
//!
//! A [`Permission`] names one verb on one resource type (`task:create`,
//! `audit:read`, ...). A [`RolePermissionMap`] grants each [`Role`] an explicit
//! [`PermissionSet`]; the map is assembled once with
//! [`RolePermissionMapBuilder`] and is read-only afterwards.
//!
//! Lookups never fail: a role with no entry in the map has the empty set, which
//! denies every permission requirement.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::role::Role;

/// A single capability of the form `<resource>:<verb>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
	#[serde(rename = "task:create")]
	TaskCreate,
	#[serde(rename = "task:read")]
	TaskRead,
	#[serde(rename = "task:update")]
	TaskUpdate,
	#[serde(rename = "task:delete")]
	TaskDelete,
	#[serde(rename = "user:create")]
	UserCreate,
	#[serde(rename = "user:read")]
	UserRead,
	#[serde(rename = "user:update")]
	UserUpdate,
	#[serde(rename = "user:delete")]
	UserDelete,
	#[serde(rename = "org:read")]
	OrgRead,
	#[serde(rename = "org:update")]
	OrgUpdate,
	#[serde(rename = "audit:read")]
	AuditRead,
}

impl Permission {
	/// Returns every known permission.
	pub fn all() -> &'static [Permission] {
		&[
			Permission::TaskCreate,
			Permission::TaskRead,
			Permission::TaskUpdate,
			Permission::TaskDelete,
			Permission::UserCreate,
			Permission::UserRead,
			Permission::UserUpdate,
			Permission::UserDelete,
			Permission::OrgRead,
			Permission::OrgUpdate,
			Permission::AuditRead,
		]
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Permission::TaskCreate => "task:create",
			Permission::TaskRead => "task:read",
			Permission::TaskUpdate => "task:update",
			Permission::TaskDelete => "task:delete",
			Permission::UserCreate => "user:create",
			Permission::UserRead => "user:read",
			Permission::UserUpdate => "user:update",
			Permission::UserDelete => "user:delete",
			Permission::OrgRead => "org:read",
			Permission::OrgUpdate => "org:update",
			Permission::AuditRead => "audit:read",
		}
	}
}

impl fmt::Display for Permission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a permission string is not one of the known permissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct PermissionParseError(pub String);

impl FromStr for Permission {
	type Err = PermissionParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Permission::all()
			.iter()
			.copied()
			.find(|p| p.as_str() == s)
			.ok_or_else(|| PermissionParseError(s.to_string()))
	}
}

/// An unordered set of permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

static EMPTY_SET: PermissionSet = PermissionSet(BTreeSet::new());

impl PermissionSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, permission: Permission) -> bool {
		self.0.contains(&permission)
	}

	/// Returns true iff every permission in `required` is in this set.
	pub fn contains_all(&self, required: &[Permission]) -> bool {
		required.iter().all(|p| self.0.contains(p))
	}

	pub fn is_superset(&self, other: &PermissionSet) -> bool {
		self.0.is_superset(&other.0)
	}

	pub fn insert(&mut self, permission: Permission) -> bool {
		self.0.insert(permission)
	}

	pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
		self.0.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl FromIterator<Permission> for PermissionSet {
	fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl fmt::Display for PermissionSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for p in &self.0 {
			if !first {
				f.write_str(", ")?;
			}
			write!(f, "{p}")?;
			first = false;
		}
		Ok(())
	}
}

/// Explicit role → permission grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionMap {
	grants: HashMap<Role, PermissionSet>,
}

static STANDARD: LazyLock<RolePermissionMap> = LazyLock::new(|| {
	use Permission::*;

	RolePermissionMap::builder()
		.grant(
			Role::Owner,
			[
				TaskCreate, TaskRead, TaskUpdate, TaskDelete, UserCreate, UserRead, UserUpdate,
				UserDelete, OrgRead, OrgUpdate, AuditRead,
			],
		)
		.grant(
			Role::Admin,
			[
				TaskCreate, TaskRead, TaskUpdate, TaskDelete, UserRead, OrgRead, AuditRead,
			],
		)
		.grant(Role::Viewer, [TaskRead, UserRead, OrgRead])
		.build()
});

impl RolePermissionMap {
	pub fn builder() -> RolePermissionMapBuilder {
		RolePermissionMapBuilder::default()
	}

	/// The built-in policy table.
	pub fn standard() -> &'static RolePermissionMap {
		&STANDARD
	}

	/// Permissions granted to `role`; empty if the role has no entry.
	pub fn permissions_of(&self, role: Role) -> &PermissionSet {
		self.grants.get(&role).unwrap_or(&EMPTY_SET)
	}

	pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
		self.permissions_of(role).contains(permission)
	}

	/// AND semantics: true iff `role` holds every permission in `required`.
	pub fn has_all_permissions(&self, role: Role, required: &[Permission]) -> bool {
		self.permissions_of(role).contains_all(required)
	}

	/// Permissions in `required` that `role` does not hold.
	pub fn missing_permissions(&self, role: Role, required: &[Permission]) -> Vec<Permission> {
		let granted = self.permissions_of(role);
		required
			.iter()
			.copied()
			.filter(|p| !granted.contains(*p))
			.collect()
	}
}

/// Builder for [`RolePermissionMap`]. Grants for the same role accumulate.
#[derive(Debug, Default)]
pub struct RolePermissionMapBuilder {
	grants: HashMap<Role, PermissionSet>,
}

impl RolePermissionMapBuilder {
	pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
		let set = self.grants.entry(role).or_default();
		for p in permissions {
			set.insert(p);
		}
		self
	}

	pub fn build(self) -> RolePermissionMap {
		RolePermissionMap {
			grants: self.grants,
		}
	}
}

/// Permissions of `role` under the built-in policy.
pub fn permissions_of(role: Role) -> &'static PermissionSet {
	RolePermissionMap::standard().permissions_of(role)
}

/// Returns true if `role` holds `permission` under the built-in policy.
pub fn has_permission(role: Role, permission: Permission) -> bool {
	RolePermissionMap::standard().has_permission(role, permission)
}

/// Returns true if `role` holds every permission in `required` under the built-in policy.
pub fn has_all_permissions(role: Role, required: &[Permission]) -> bool {
	RolePermissionMap::standard().has_all_permissions(role, required)
}
