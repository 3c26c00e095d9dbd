// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use keel_server_auth::LookupError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for LookupError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::Internal(msg) => LookupError::Inconsistent(msg),
			other => LookupError::Backend(other.to_string()),
		}
	}
}

pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> DbError {
	match e {
		sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
			DbError::Conflict(message.to_string())
		}
		_ => DbError::Sqlx(e),
	}
}
