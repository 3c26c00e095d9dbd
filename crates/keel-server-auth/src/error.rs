// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use uuid::Uuid;

use crate::authz::{DenyReason, ResourceKind};

/// A collaborator (organization store, resource store) could not answer.
///
/// Never interpreted as a deny: callers surface it as an infrastructure failure.
#[derive(Debug, Error)]
pub enum LookupError {
	#[error("lookup backend error: {0}")]
	Backend(String),

	#[error("organization hierarchy is inconsistent: {0}")]
	Inconsistent(String),
}

/// Outcome of a failed authorization, in the order the checks run.
#[derive(Debug, Error)]
pub enum AuthzError {
	#[error("authentication required")]
	Unauthenticated,

	#[error("access denied: {0}")]
	Forbidden(DenyReason),

	#[error("{kind} {id} not found")]
	NotFound { kind: ResourceKind, id: Uuid },

	#[error(transparent)]
	Lookup(#[from] LookupError),
}

impl AuthzError {
	/// HTTP status the request layer should answer with.
	pub fn status_code(&self) -> u16 {
		match self {
			AuthzError::Unauthenticated => 401,
			AuthzError::Forbidden(_) => 403,
			AuthzError::NotFound { .. } => 404,
			AuthzError::Lookup(_) => 500,
		}
	}

	/// The deny classification, if this error is a policy denial.
	pub fn deny_reason(&self) -> Option<DenyReason> {
		match self {
			AuthzError::Unauthenticated => Some(DenyReason::Unauthenticated),
			AuthzError::Forbidden(reason) => Some(*reason),
			_ => None,
		}
	}
}

impl From<DenyReason> for AuthzError {
	fn from(reason: DenyReason) -> Self {
		match reason {
			DenyReason::Unauthenticated => AuthzError::Unauthenticated,
			other => AuthzError::Forbidden(other),
		}
	}
}
