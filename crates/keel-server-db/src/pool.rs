// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

/// Create a SqlitePool with WAL mode and foreign keys enforced.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./keel.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"organizations",
		r#"
		CREATE TABLE IF NOT EXISTS organizations (
			id TEXT PRIMARY KEY NOT NULL,
			name TEXT NOT NULL,
			parent_id TEXT REFERENCES organizations(id),
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			CHECK (parent_id IS NULL OR parent_id <> id)
		)
		"#,
	),
	(
		"idx_organizations_parent",
		"CREATE INDEX IF NOT EXISTS idx_organizations_parent ON organizations(parent_id)",
	),
	(
		"users",
		r#"
		CREATE TABLE IF NOT EXISTS users (
			id TEXT PRIMARY KEY NOT NULL,
			email TEXT NOT NULL UNIQUE,
			first_name TEXT NOT NULL,
			last_name TEXT NOT NULL,
			role TEXT NOT NULL DEFAULT 'viewer' CHECK (role IN ('owner', 'admin', 'viewer')),
			organization_id TEXT NOT NULL REFERENCES organizations(id),
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	),
	(
		"tasks",
		r#"
		CREATE TABLE IF NOT EXISTS tasks (
			id TEXT PRIMARY KEY NOT NULL,
			title TEXT NOT NULL,
			description TEXT,
			status TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in_progress', 'done')),
			priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
			category TEXT NOT NULL DEFAULT 'work' CHECK (category IN ('work', 'personal', 'urgent', 'other')),
			due_date TEXT,
			sort_order INTEGER NOT NULL DEFAULT 0,
			created_by_id TEXT NOT NULL REFERENCES users(id),
			assignee_id TEXT REFERENCES users(id) ON DELETE SET NULL,
			organization_id TEXT NOT NULL REFERENCES organizations(id),
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	),
	(
		"idx_tasks_organization",
		"CREATE INDEX IF NOT EXISTS idx_tasks_organization ON tasks(organization_id)",
	),
	(
		"idx_tasks_assignee",
		"CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assignee_id)",
	),
	(
		"audit_logs",
		r#"
		CREATE TABLE IF NOT EXISTS audit_logs (
			id TEXT PRIMARY KEY NOT NULL,
			user_id TEXT NOT NULL,
			user_email TEXT NOT NULL,
			action TEXT NOT NULL,
			resource TEXT NOT NULL,
			resource_id TEXT,
			details TEXT,
			ip_address TEXT,
			timestamp TEXT NOT NULL
		)
		"#,
	),
	(
		"idx_audit_logs_timestamp",
		"CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs(timestamp)",
	),
];

/// Create all tables and indexes. Safe to run on every start.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		sqlx::query(sql).execute(pool).await.map_err(|e| {
			tracing::error!(migration = *name, error = %e, "migration failed");
			DbError::Sqlx(e)
		})?;
	}

	tracing::info!(count = MIGRATIONS.len(), "database migrations applied");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = create_test_pool().await;
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<(String,)> = sqlx::query_as(
			"SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();
		let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
		assert_eq!(names, vec!["audit_logs", "organizations", "tasks", "users"]);
	}

	#[tokio::test]
	async fn create_pool_creates_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("keel.db");
		let pool = create_pool(&format!("sqlite:{}", path.display())).await.unwrap();
		run_migrations(&pool).await.unwrap();
		assert!(path.exists());
	}
}
