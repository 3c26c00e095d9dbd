// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
	/// No identity on a non-public operation.
	Unauthenticated,
	/// The role does not dominate any declared role.
	RoleDenied,
	/// A declared permission is not granted to the role.
	PermissionDenied,
	/// The resource is outside the accessible organizations and not assigned to the caller.
	ScopeDenied,
	/// A write rule based on creatorship or admin rank failed.
	OwnershipDenied,
}

impl DenyReason {
	/// Ownership failures are reported to users as permission failures.
	pub fn is_permission_failure(self) -> bool {
		matches!(self, DenyReason::PermissionDenied | DenyReason::OwnershipDenied)
	}

	/// Generic message safe to show to the caller.
	pub fn public_message(self) -> &'static str {
		match self {
			DenyReason::Unauthenticated => "Authentication required",
			DenyReason::RoleDenied | DenyReason::PermissionDenied => "Insufficient permissions",
			DenyReason::ScopeDenied => "You do not have access to this resource",
			DenyReason::OwnershipDenied => "You can only modify resources you created",
		}
	}
}

impl fmt::Display for DenyReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			DenyReason::Unauthenticated => "unauthenticated",
			DenyReason::RoleDenied => "role_denied",
			DenyReason::PermissionDenied => "permission_denied",
			DenyReason::ScopeDenied => "scope_denied",
			DenyReason::OwnershipDenied => "ownership_denied",
		};
		f.write_str(s)
	}
}

/// Result of evaluating the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Decision {
	Allow,
	Deny(DenyReason),
}

impl Decision {
	pub fn is_allowed(self) -> bool {
		matches!(self, Decision::Allow)
	}

	pub fn deny_reason(self) -> Option<DenyReason> {
		match self {
			Decision::Allow => None,
			Decision::Deny(reason) => Some(reason),
		}
	}

	/// Evaluates the next gate only if this one allowed.
	pub fn and_then(self, next: impl FnOnce() -> Decision) -> Decision {
		match self {
			Decision::Allow => next(),
			deny => deny,
		}
	}

	/// `Allow` if `condition` holds, otherwise `Deny(reason)`.
	pub fn require(condition: bool, reason: DenyReason) -> Decision {
		if condition {
			Decision::Allow
		} else {
			Decision::Deny(reason)
		}
	}

	pub fn into_result(self) -> Result<(), DenyReason> {
		match self {
			Decision::Allow => Ok(()),
			Decision::Deny(reason) => Err(reason),
		}
	}
}

impl fmt::Display for Decision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Decision::Allow => f.write_str("allow"),
			Decision::Deny(reason) => write!(f, "deny({reason})"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn and_then_short_circuits_on_deny() {
		let mut called = false;
		let d = Decision::Deny(DenyReason::RoleDenied).and_then(|| {
			called = true;
			Decision::Allow
		});
		assert_eq!(d, Decision::Deny(DenyReason::RoleDenied));
		assert!(!called);
	}

	#[test]
	fn and_then_continues_on_allow() {
		let d = Decision::Allow.and_then(|| Decision::Deny(DenyReason::ScopeDenied));
		assert_eq!(d.deny_reason(), Some(DenyReason::ScopeDenied));
	}

	#[test]
	fn ownership_counts_as_permission_failure() {
		assert!(DenyReason::OwnershipDenied.is_permission_failure());
		assert!(DenyReason::PermissionDenied.is_permission_failure());
		assert!(!DenyReason::ScopeDenied.is_permission_failure());
		assert!(!DenyReason::RoleDenied.is_permission_failure());
	}

	#[test]
	fn serializes_with_reason() {
		let json = serde_json::to_string(&Decision::Deny(DenyReason::ScopeDenied)).unwrap();
		assert_eq!(json, r#"{"outcome":"deny","reason":"scope_denied"}"#);
		let json = serde_json::to_string(&Decision::Allow).unwrap();
		assert_eq!(json, r#"{"outcome":"allow"}"#);
	}

	#[test]
	fn display() {
		assert_eq!(Decision::Allow.to_string(), "allow");
		assert_eq!(
			Decision::Deny(DenyReason::OwnershipDenied).to_string(),
			"deny(ownership_denied)"
		);
	}
}
