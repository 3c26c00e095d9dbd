// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization repository.
//!
//! Organizations form a forest through `parent_id`. Writes keep it acyclic:
//! a parent must exist, an organization cannot be its own parent, and a
//! re-parent that would place an organization under its own descendant is
//! rejected with [`DbError::Conflict`].

use async_trait::async_trait;
use chrono::Utc;
use keel_server_auth::{LookupError, OrgHierarchy, OrgId, Organization};
use sqlx::{sqlite::SqlitePool, Row};

use crate::convert::{parse_id, parse_opt_id, parse_timestamp};
use crate::error::DbError;

#[async_trait]
pub trait OrgStore: Send + Sync {
	async fn create(&self, org: &Organization) -> Result<(), DbError>;
	async fn get(&self, id: OrgId) -> Result<Option<Organization>, DbError>;
	async fn list(&self) -> Result<Vec<Organization>, DbError>;
	async fn list_children(&self, parent: OrgId) -> Result<Vec<Organization>, DbError>;
	async fn update(&self, org: &Organization) -> Result<(), DbError>;
	async fn delete(&self, id: OrgId) -> Result<bool, DbError>;
}

/// Repository for organization database operations.
#[derive(Clone)]
pub struct OrgRepository {
	pool: SqlitePool,
}

impl OrgRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a new organization.
	///
	/// # Errors
	/// - `DbError::Conflict` if the organization names itself as parent or the ID exists
	/// - `DbError::NotFound` if the parent does not exist
	#[tracing::instrument(skip(self, org), fields(org_id = %org.id))]
	pub async fn create(&self, org: &Organization) -> Result<(), DbError> {
		if let Some(parent) = org.parent_id {
			self.validate_parent(org.id, parent).await?;
		}

		sqlx::query(
			r#"
			INSERT INTO organizations (id, name, parent_id, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(org.id.to_string())
		.bind(&org.name)
		.bind(org.parent_id.map(|p| p.to_string()))
		.bind(org.created_at.to_rfc3339())
		.bind(org.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(format!("Organization {} already exists", org.id))
			}
			_ => DbError::Sqlx(e),
		})?;

		tracing::debug!(org_id = %org.id, parent_id = ?org.parent_id, "organization created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn get(&self, id: OrgId) -> Result<Option<Organization>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, parent_id, created_at, updated_at
			FROM organizations
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_org(&r)).transpose()
	}

	/// All organizations, ordered by name.
	#[tracing::instrument(skip(self))]
	pub async fn list(&self) -> Result<Vec<Organization>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, name, parent_id, created_at, updated_at
			FROM organizations
			ORDER BY name ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_org).collect()
	}

	#[tracing::instrument(skip(self), fields(parent_id = %parent))]
	pub async fn list_children(&self, parent: OrgId) -> Result<Vec<Organization>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, name, parent_id, created_at, updated_at
			FROM organizations
			WHERE parent_id = ?
			ORDER BY name ASC
			"#,
		)
		.bind(parent.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_org).collect()
	}

	/// Update name and parent.
	///
	/// # Errors
	/// - `DbError::NotFound` if the organization or the new parent does not exist
	/// - `DbError::Conflict` if the new parent is the organization or one of its descendants
	#[tracing::instrument(skip(self, org), fields(org_id = %org.id))]
	pub async fn update(&self, org: &Organization) -> Result<(), DbError> {
		if let Some(parent) = org.parent_id {
			self.validate_parent(org.id, parent).await?;
			if self.is_descendant_or_self(parent, org.id).await? {
				return Err(DbError::Conflict(format!(
					"Organization {parent} is a descendant of {}",
					org.id
				)));
			}
		}

		let result = sqlx::query(
			r#"
			UPDATE organizations
			SET name = ?, parent_id = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&org.name)
		.bind(org.parent_id.map(|p| p.to_string()))
		.bind(Utc::now().to_rfc3339())
		.bind(org.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("Organization {}", org.id)));
		}

		tracing::debug!(org_id = %org.id, parent_id = ?org.parent_id, "organization updated");
		Ok(())
	}

	/// Delete an organization with no child organizations.
	///
	/// Returns `false` if it did not exist.
	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn delete(&self, id: OrgId) -> Result<bool, DbError> {
		let children: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE parent_id = ?")
				.bind(id.to_string())
				.fetch_one(&self.pool)
				.await?;
		if children > 0 {
			return Err(DbError::Conflict(format!(
				"Organization {id} still has {children} child organization(s)"
			)));
		}

		let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	async fn validate_parent(&self, id: OrgId, parent: OrgId) -> Result<(), DbError> {
		if parent == id {
			return Err(DbError::Conflict(format!(
				"Organization {id} cannot be its own parent"
			)));
		}
		if self.get(parent).await?.is_none() {
			return Err(DbError::NotFound(format!("Parent organization {parent}")));
		}
		Ok(())
	}

	/// Returns true if `candidate` is `root` or lies below it.
	async fn is_descendant_or_self(&self, candidate: OrgId, root: OrgId) -> Result<bool, DbError> {
		// UNION drops repeated rows, which stops the walk on a malformed cycle.
		let found: i64 = sqlx::query_scalar(
			r#"
			WITH RECURSIVE ancestors(id) AS (
				SELECT ?
				UNION
				SELECT o.parent_id FROM organizations o
				JOIN ancestors a ON o.id = a.id
				WHERE o.parent_id IS NOT NULL
			)
			SELECT COUNT(*) FROM ancestors WHERE id = ?
			"#,
		)
		.bind(candidate.to_string())
		.bind(root.to_string())
		.fetch_one(&self.pool)
		.await?;

		Ok(found > 0)
	}
}

#[async_trait]
impl OrgStore for OrgRepository {
	async fn create(&self, org: &Organization) -> Result<(), DbError> {
		OrgRepository::create(self, org).await
	}

	async fn get(&self, id: OrgId) -> Result<Option<Organization>, DbError> {
		OrgRepository::get(self, id).await
	}

	async fn list(&self) -> Result<Vec<Organization>, DbError> {
		OrgRepository::list(self).await
	}

	async fn list_children(&self, parent: OrgId) -> Result<Vec<Organization>, DbError> {
		OrgRepository::list_children(self, parent).await
	}

	async fn update(&self, org: &Organization) -> Result<(), DbError> {
		OrgRepository::update(self, org).await
	}

	async fn delete(&self, id: OrgId) -> Result<bool, DbError> {
		OrgRepository::delete(self, id).await
	}
}

#[async_trait]
impl OrgHierarchy for OrgRepository {
	async fn child_org_ids(&self, parent: OrgId) -> Result<Vec<OrgId>, LookupError> {
		let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM organizations WHERE parent_id = ?")
			.bind(parent.to_string())
			.fetch_all(&self.pool)
			.await
			.map_err(DbError::from)?;

		ids
			.iter()
			.map(|id| parse_id(id, "organization id").map_err(LookupError::from))
			.collect()
	}
}

fn row_to_org(row: &sqlx::sqlite::SqliteRow) -> Result<Organization, DbError> {
	let id: String = row.get("id");
	let parent_id: Option<String> = row.get("parent_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Organization {
		id: parse_id(&id, "organization id")?,
		name: row.get("name"),
		parent_id: parse_opt_id(parent_id, "parent_id")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}
