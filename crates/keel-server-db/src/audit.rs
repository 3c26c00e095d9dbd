// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use keel_server_auth::{AuditError, AuditLogEntry, AuditRecorder, UserId, AUDIT_LIST_LIMIT};
use sqlx::{sqlite::SqlitePool, Row};

use crate::convert::{parse_enum, parse_id, parse_timestamp};
use crate::error::DbError;

const AUDIT_COLUMNS: &str =
	"id, user_id, user_email, action, resource, resource_id, details, ip_address, timestamp";

/// Persists audit entries to the `audit_logs` table.
#[derive(Clone)]
pub struct SqliteAuditRecorder {
	pool: SqlitePool,
}

impl SqliteAuditRecorder {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, entry), fields(audit_id = %entry.id, action = %entry.action))]
	pub async fn insert(&self, entry: &AuditLogEntry) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO audit_logs (id, user_id, user_email, action, resource, resource_id, details, ip_address, timestamp)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(entry.id.to_string())
		.bind(entry.user_id.to_string())
		.bind(&entry.user_email)
		.bind(entry.action.as_str())
		.bind(&entry.resource)
		.bind(&entry.resource_id)
		.bind(&entry.details)
		.bind(&entry.ip_address)
		.bind(entry.timestamp.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Most recent entries first, at most [`AUDIT_LIST_LIMIT`].
	#[tracing::instrument(skip(self))]
	pub async fn list_recent(&self) -> Result<Vec<AuditLogEntry>, DbError> {
		let rows = sqlx::query(&format!(
			"SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY timestamp DESC LIMIT ?"
		))
		.bind(AUDIT_LIST_LIMIT as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_entry).collect()
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<AuditLogEntry>, DbError> {
		let rows = sqlx::query(&format!(
			"SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE user_id = ? ORDER BY timestamp DESC"
		))
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_entry).collect()
	}

	/// Entries for a resource type, optionally narrowed to one instance.
	#[tracing::instrument(skip(self))]
	pub async fn list_by_resource(
		&self,
		resource: &str,
		resource_id: Option<&str>,
	) -> Result<Vec<AuditLogEntry>, DbError> {
		let rows = match resource_id {
			Some(id) => {
				sqlx::query(&format!(
					"SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE resource = ? AND resource_id = ? ORDER BY timestamp DESC"
				))
				.bind(resource)
				.bind(id)
				.fetch_all(&self.pool)
				.await?
			}
			None => {
				sqlx::query(&format!(
					"SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE resource = ? ORDER BY timestamp DESC"
				))
				.bind(resource)
				.fetch_all(&self.pool)
				.await?
			}
		};

		rows.iter().map(row_to_entry).collect()
	}
}

#[async_trait]
impl AuditRecorder for SqliteAuditRecorder {
	fn name(&self) -> &str {
		"sqlite"
	}

	async fn record(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
		tracing::info!(target: "audit", "{entry}");
		self
			.insert(entry)
			.await
			.map_err(|e| AuditError::Store(e.to_string()))
	}
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<AuditLogEntry, DbError> {
	let id: String = row.get("id");
	let user_id: String = row.get("user_id");
	let action: String = row.get("action");
	let timestamp: String = row.get("timestamp");

	Ok(AuditLogEntry {
		id: parse_id(&id, "audit log id")?,
		timestamp: parse_timestamp(&timestamp, "timestamp")?,
		user_id: parse_id(&user_id, "user_id")?,
		user_email: row.get("user_email"),
		action: parse_enum(&action, "action")?,
		resource: row.get("resource"),
		resource_id: row.get("resource_id"),
		details: row.get("details"),
		ip_address: row.get("ip_address"),
	})
}
