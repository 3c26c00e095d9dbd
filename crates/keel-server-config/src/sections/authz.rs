// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization configuration.
//!
//! ```toml
//! [authz]
//! scope_depth = 2
//! audit_reads = false
//!
//! [authz.role_permissions]
//! owner = ["task:create", "task:read", "org:update"]
//! viewer = ["task:read"]
//! ```
//!
//! When `role_permissions` is present it replaces the built-in matrix as a
//! whole. Roles it does not mention are granted nothing.

use std::collections::BTreeMap;

use keel_server_auth::{Permission, Role, RolePermissionMap, ScopeDepth};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
	pub scope_depth: ScopeDepth,
	pub audit_reads: bool,
	pub role_permissions: RolePermissionMap,
	/// True when `role_permissions` came from configuration rather than the
	/// built-in table.
	pub custom_role_permissions: bool,
}

impl Default for AuthzConfig {
	fn default() -> Self {
		Self {
			scope_depth: ScopeDepth::default(),
			audit_reads: true,
			role_permissions: RolePermissionMap::standard().clone(),
			custom_role_permissions: false,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzConfigLayer {
	#[serde(default)]
	pub scope_depth: Option<u8>,
	#[serde(default)]
	pub audit_reads: Option<bool>,
	#[serde(default)]
	pub role_permissions: Option<BTreeMap<String, Vec<String>>>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: AuthzConfigLayer) {
		if other.scope_depth.is_some() {
			self.scope_depth = other.scope_depth;
		}
		if other.audit_reads.is_some() {
			self.audit_reads = other.audit_reads;
		}
		if other.role_permissions.is_some() {
			self.role_permissions = other.role_permissions;
		}
	}

	pub fn finalize(self) -> Result<AuthzConfig, ConfigError> {
		let scope_depth = match self.scope_depth {
			Some(levels) => ScopeDepth::new(levels).ok_or_else(|| ConfigError::InvalidValue {
				key: "authz.scope_depth".to_string(),
				message: format!("{levels} exceeds the maximum of {}", ScopeDepth::MAX),
			})?,
			None => ScopeDepth::default(),
		};

		let (role_permissions, custom_role_permissions) = match self.role_permissions {
			Some(table) => (parse_role_permissions(&table)?, true),
			None => (RolePermissionMap::standard().clone(), false),
		};

		Ok(AuthzConfig {
			scope_depth,
			audit_reads: self.audit_reads.unwrap_or(true),
			role_permissions,
			custom_role_permissions,
		})
	}
}

fn parse_role_permissions(
	table: &BTreeMap<String, Vec<String>>,
) -> Result<RolePermissionMap, ConfigError> {
	let mut builder = RolePermissionMap::builder();
	for (role, permissions) in table {
		let key = format!("authz.role_permissions.{role}");
		let role: Role = role.parse().map_err(|e| ConfigError::InvalidValue {
			key: key.clone(),
			message: format!("{e}"),
		})?;
		let permissions = permissions
			.iter()
			.map(|p| p.parse::<Permission>())
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| ConfigError::InvalidValue {
				key,
				message: format!("{e}"),
			})?;
		builder = builder.grant(role, permissions);
	}
	Ok(builder.build())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
		entries
			.iter()
			.map(|(role, perms)| {
				(
					role.to_string(),
					perms.iter().map(|p| p.to_string()).collect(),
				)
			})
			.collect()
	}

	#[test]
	fn defaults_match_builtin_policy() {
		let config = AuthzConfigLayer::default().finalize().unwrap();
		assert_eq!(config, AuthzConfig::default());
		assert_eq!(config.scope_depth.levels(), 1);
		assert!(config.audit_reads);
		assert!(!config.custom_role_permissions);
	}

	#[test]
	fn scope_depth_is_bounded() {
		let config = AuthzConfigLayer {
			scope_depth: Some(ScopeDepth::MAX),
			..Default::default()
		}
		.finalize()
		.unwrap();
		assert_eq!(config.scope_depth.levels(), ScopeDepth::MAX);

		let err = AuthzConfigLayer {
			scope_depth: Some(ScopeDepth::MAX + 1),
			..Default::default()
		}
		.finalize()
		.unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "authz.scope_depth"));
	}

	#[test]
	fn role_permissions_replace_the_builtin_table() {
		let config = AuthzConfigLayer {
			role_permissions: Some(table(&[("admin", &["task:read", "audit:read"])])),
			..Default::default()
		}
		.finalize()
		.unwrap();

		let map = &config.role_permissions;
		assert!(config.custom_role_permissions);
		assert!(map.has_permission(Role::Admin, Permission::AuditRead));
		assert!(!map.has_permission(Role::Admin, Permission::TaskCreate));
		assert!(map.permissions_of(Role::Owner).is_empty());
		assert!(map.permissions_of(Role::Viewer).is_empty());
	}

	#[test]
	fn unknown_role_is_rejected() {
		let err = AuthzConfigLayer {
			role_permissions: Some(table(&[("superuser", &["task:read"])])),
			..Default::default()
		}
		.finalize()
		.unwrap_err();
		assert!(err.to_string().contains("superuser"));
	}

	#[test]
	fn unknown_permission_is_rejected() {
		let err = AuthzConfigLayer {
			role_permissions: Some(table(&[("viewer", &["task:read", "task:archive"])])),
			..Default::default()
		}
		.finalize()
		.unwrap_err();
		match err {
			ConfigError::InvalidValue { key, message } => {
				assert_eq!(key, "authz.role_permissions.viewer");
				assert!(message.contains("task:archive"));
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn merge_overrides_field_by_field() {
		let mut base = AuthzConfigLayer {
			scope_depth: Some(3),
			audit_reads: Some(false),
			role_permissions: None,
		};
		base.merge(AuthzConfigLayer {
			scope_depth: Some(0),
			..Default::default()
		});
		let config = base.finalize().unwrap();
		assert_eq!(config.scope_depth, ScopeDepth::HOME_ONLY);
		assert!(!config.audit_reads);
	}
}
