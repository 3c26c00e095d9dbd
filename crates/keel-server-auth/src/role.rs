// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The ranked role hierarchy.
//!
//! Every principal carries exactly one [`Role`]. Roles are totally ordered by
//! [`Role::rank`]; a role *dominates* another when its rank is greater than or
//! equal to the other's, so `Owner` satisfies any requirement an `Admin` or
//! `Viewer` would.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles a principal may hold within its home organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Full control: user management, organization settings, everything an admin can do.
	Owner,
	/// Manages tasks across the organization and reads the audit log.
	Admin,
	/// Read-only access to tasks, users and the organization.
	Viewer,
}

impl Role {
	/// Returns all roles, highest rank first.
	pub fn all() -> &'static [Role] {
		&[Role::Owner, Role::Admin, Role::Viewer]
	}

	/// Position of this role in the hierarchy. Higher is more trusted.
	pub const fn rank(self) -> u8 {
		match self {
			Role::Owner => 3,
			Role::Admin => 2,
			Role::Viewer => 1,
		}
	}

	/// Returns true if this role has at least the trust of `other`.
	pub const fn dominates(self, other: Role) -> bool {
		self.rank() >= other.rank()
	}

	/// Returns true if this role dominates at least one of `required`.
	///
	/// An empty requirement list is not handled here; the role gate treats it
	/// as "no role requirement" before calling this.
	pub fn dominates_any(self, required: &[Role]) -> bool {
		required.iter().any(|r| self.dominates(*r))
	}

	/// Wire name of the role.
	pub fn as_str(self) -> &'static str {
		match self {
			Role::Owner => "owner",
			Role::Admin => "admin",
			Role::Viewer => "viewer",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
	type Err = RoleParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"owner" => Ok(Role::Owner),
			"admin" => Ok(Role::Admin),
			"viewer" => Ok(Role::Viewer),
			other => Err(RoleParseError(other.to_string())),
		}
	}
}
