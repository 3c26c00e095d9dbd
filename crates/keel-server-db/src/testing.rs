// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use keel_server_auth::{OrgId, Organization, Role};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::org::OrgRepository;
use crate::pool::run_migrations;
use crate::user::{NewUser, User, UserRepository};

/// In-memory database on a single connection, so every query sees the same data.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.unwrap()
		.foreign_keys(true);

	SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("Failed to create test pool")
}

pub async fn create_migrated_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	run_migrations(&pool).await.unwrap();
	pool
}

pub async fn seed_org(pool: &SqlitePool, name: &str, parent: Option<OrgId>) -> OrgId {
	let org = match parent {
		Some(parent) => Organization::child_of(parent, name),
		None => Organization::root(name),
	};
	OrgRepository::new(pool.clone()).create(&org).await.unwrap();
	org.id
}

pub async fn seed_user(pool: &SqlitePool, email: &str, role: Role, org: OrgId) -> User {
	let new_user = NewUser {
		email: email.to_string(),
		first_name: "Test".to_string(),
		last_name: "User".to_string(),
		role,
		organization_id: org,
	};
	UserRepository::new(pool.clone()).create(new_user).await.unwrap()
}
