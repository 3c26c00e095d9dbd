// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated caller and the per-request auth context.
//!
//! A [`Principal`] carries the claims an upstream authentication layer has
//! already validated. The engine trusts these claims as-is; it never looks at
//! tokens or signatures. The serde field names match the token payload
//! (`sub`, `email`, `role`, `organizationId`), so a payload with an unknown
//! role fails to deserialize instead of producing a principal.

use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::types::{OrgId, UserId};

/// Validated identity claims of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	#[serde(rename = "sub")]
	pub subject_id: UserId,
	pub email: String,
	pub role: Role,
	/// The caller's home organization.
	#[serde(rename = "organizationId")]
	pub organization_id: OrgId,
}

impl Principal {
	pub fn new(
		subject_id: UserId,
		email: impl Into<String>,
		role: Role,
		organization_id: OrgId,
	) -> Self {
		Self {
			subject_id,
			email: email.into(),
			role,
			organization_id,
		}
	}

	/// Returns true if the principal's role is admin or above.
	pub fn is_admin(&self) -> bool {
		self.role.dominates(Role::Admin)
	}
}

/// Authentication state for one request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
	principal: Option<Principal>,
}

impl AuthContext {
	pub fn unauthenticated() -> Self {
		Self { principal: None }
	}

	pub fn authenticated(principal: Principal) -> Self {
		Self {
			principal: Some(principal),
		}
	}

	pub fn is_authenticated(&self) -> bool {
		self.principal.is_some()
	}

	pub fn principal(&self) -> Option<&Principal> {
		self.principal.as_ref()
	}

	/// Require authentication, returning the principal or an error.
	pub fn require_principal(&self) -> Result<&Principal, AuthRequired> {
		self.principal.as_ref().ok_or(AuthRequired)
	}
}

/// Error returned when authentication is required but not present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("authentication required")]
pub struct AuthRequired;
