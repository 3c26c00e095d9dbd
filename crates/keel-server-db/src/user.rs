// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User repository.
//!
//! Users belong to exactly one home organization and hold one role there.
//! Credentials are managed by the authentication service and are not stored
//! here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keel_server_auth::{OrgId, Principal, ResourceSnapshot, Role, ScopeFilter, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};

use crate::convert::{parse_enum, parse_id, parse_timestamp};
use crate::error::{map_unique_violation, DbError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: UserId,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub role: Role,
	pub organization_id: OrgId,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl User {
	/// The identity claims an authenticated request for this user carries.
	pub fn principal(&self) -> Principal {
		Principal::new(self.id, self.email.clone(), self.role, self.organization_id)
	}

	pub fn snapshot(&self) -> ResourceSnapshot {
		ResourceSnapshot::user(self.id, self.organization_id)
	}
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub role: Role,
	pub organization_id: OrgId,
}

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn create(&self, new_user: NewUser) -> Result<User, DbError>;
	async fn get(&self, id: UserId) -> Result<Option<User>, DbError>;
	async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
	async fn list(&self, scope: &ScopeFilter) -> Result<Vec<User>, DbError>;
	async fn update_role(&self, id: UserId, role: Role) -> Result<User, DbError>;
	async fn delete(&self, id: UserId) -> Result<bool, DbError>;
}

#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a user. Emails are unique across all organizations.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the email is already registered.
	#[tracing::instrument(skip(self, new_user), fields(org_id = %new_user.organization_id, role = %new_user.role))]
	pub async fn create(&self, new_user: NewUser) -> Result<User, DbError> {
		let now = Utc::now();
		let user = User {
			id: UserId::generate(),
			email: new_user.email,
			first_name: new_user.first_name,
			last_name: new_user.last_name,
			role: new_user.role,
			organization_id: new_user.organization_id,
			created_at: now,
			updated_at: now,
		};

		sqlx::query(
			r#"
			INSERT INTO users (id, email, first_name, last_name, role, organization_id, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.email)
		.bind(&user.first_name)
		.bind(&user.last_name)
		.bind(user.role.as_str())
		.bind(user.organization_id.to_string())
		.bind(user.created_at.to_rfc3339())
		.bind(user.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| map_unique_violation(e, "User with this email already exists"))?;

		tracing::debug!(user_id = %user.id, "user created");
		Ok(user)
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get(&self, id: UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, first_name, last_name, role, organization_id, created_at, updated_at
			FROM users
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	#[tracing::instrument(skip(self, email))]
	pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, first_name, last_name, role, organization_id, created_at, updated_at
			FROM users
			WHERE email = ?
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// Users in the organizations of `scope`, ordered by email.
	#[tracing::instrument(skip(self, scope), fields(org_count = scope.org_ids.len()))]
	pub async fn list(&self, scope: &ScopeFilter) -> Result<Vec<User>, DbError> {
		let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
			"SELECT id, email, first_name, last_name, role, organization_id, created_at, updated_at FROM users WHERE ",
		);
		crate::task::push_scope(&mut qb, scope, None);
		qb.push(" ORDER BY email ASC");

		let rows = qb.build().fetch_all(&self.pool).await?;
		rows.iter().map(row_to_user).collect()
	}

	#[tracing::instrument(skip(self), fields(user_id = %id, role = %role))]
	pub async fn update_role(&self, id: UserId, role: Role) -> Result<User, DbError> {
		let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
			.bind(role.as_str())
			.bind(Utc::now().to_rfc3339())
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("User {id}")));
		}

		self
			.get(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("User {id}")))
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn delete(&self, id: UserId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM users WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
impl UserStore for UserRepository {
	async fn create(&self, new_user: NewUser) -> Result<User, DbError> {
		UserRepository::create(self, new_user).await
	}

	async fn get(&self, id: UserId) -> Result<Option<User>, DbError> {
		UserRepository::get(self, id).await
	}

	async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		UserRepository::get_by_email(self, email).await
	}

	async fn list(&self, scope: &ScopeFilter) -> Result<Vec<User>, DbError> {
		UserRepository::list(self, scope).await
	}

	async fn update_role(&self, id: UserId, role: Role) -> Result<User, DbError> {
		UserRepository::update_role(self, id, role).await
	}

	async fn delete(&self, id: UserId) -> Result<bool, DbError> {
		UserRepository::delete(self, id).await
	}
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id: String = row.get("id");
	let role: String = row.get("role");
	let organization_id: String = row.get("organization_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(User {
		id: parse_id(&id, "user id")?,
		email: row.get("email"),
		first_name: row.get("first_name"),
		last_name: row.get("last_name"),
		role: parse_enum(&role, "role")?,
		organization_id: parse_id(&organization_id, "organization_id")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}
