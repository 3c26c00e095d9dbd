// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline views of the policy: the permission matrix, the operation table
//! and gate-by-gate explanations. Nothing here touches the database.

use std::fmt::Write;

use anyhow::{anyhow, Result};
use keel_server_auth::{
	operations, Decision, OperationDescriptor, OrgId, Permission, PolicyEngine, Principal, Role,
	RolePermissionMap, UserId,
};
use serde::Serialize;

#[derive(Serialize)]
struct MatrixRow {
	role: Role,
	permissions: Vec<Permission>,
}

/// Role × permission grid, one row per role.
pub fn render_matrix(map: &RolePermissionMap) -> String {
	let width = Permission::all()
		.iter()
		.map(|p| p.as_str().len())
		.max()
		.unwrap_or(0);

	let mut out = format!("{:width$}", "");
	for role in Role::all() {
		let _ = write!(out, "  {:>6}", role.as_str());
	}
	out.push('\n');

	for permission in Permission::all() {
		let _ = write!(out, "{:width$}", permission.as_str());
		for role in Role::all() {
			let mark = if map.has_permission(*role, *permission) { "x" } else { "." };
			let _ = write!(out, "  {mark:>6}");
		}
		out.push('\n');
	}
	out
}

pub fn matrix_json(map: &RolePermissionMap) -> Result<String> {
	let rows: Vec<MatrixRow> = Role::all()
		.iter()
		.map(|role| MatrixRow {
			role: *role,
			permissions: map.permissions_of(*role).iter().collect(),
		})
		.collect();
	Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn render_operations() -> String {
	let mut out = String::new();
	for op in operations::all() {
		let roles = if op.is_public() {
			"public".to_string()
		} else if op.required_roles().is_empty() {
			"any".to_string()
		} else {
			join(op.required_roles().iter().map(|r| r.as_str()))
		};
		let permissions = join(op.required_permissions().iter().map(|p| p.as_str()));
		let _ = writeln!(
			out,
			"{:<14} {:<12} {:<7} roles={roles} permissions=[{permissions}]{}",
			op.name(),
			op.resource().as_str(),
			op.action().to_string(),
			if op.is_resource_scoped() { " scoped" } else { "" },
		);
	}
	out
}

pub fn find_operation(name: &str) -> Result<&'static OperationDescriptor> {
	operations::find(name).ok_or_else(|| anyhow!("unknown operation '{name}'"))
}

/// Evaluates the role and permission gates for `role` and describes each one.
/// Scope and ownership depend on a concrete resource and are reported as
/// pending for scoped operations.
pub fn explain(engine: &PolicyEngine, op: &OperationDescriptor, role: Role) -> (Decision, String) {
	let principal = Principal::new(UserId::generate(), "explain@keel.local", role, OrgId::generate());
	let decision = engine.check_operation(Some(&principal), op);

	let mut out = format!("operation {} as {role}\n", op.name());
	if op.is_public() {
		out.push_str("  public: no gates apply\n");
		return (decision, out);
	}

	let required = op.required_roles();
	let role_ok = required.is_empty() || role.dominates_any(required);
	let _ = writeln!(
		out,
		"  role gate:       {} (requires {})",
		pass(role_ok),
		if required.is_empty() {
			"any role".to_string()
		} else {
			join(required.iter().map(|r| r.as_str()))
		}
	);

	let missing = engine
		.permissions()
		.missing_permissions(role, op.required_permissions());
	let _ = writeln!(
		out,
		"  permission gate: {}{}",
		pass(missing.is_empty()),
		if missing.is_empty() {
			String::new()
		} else {
			format!(" (missing {})", join(missing.iter().map(|p| p.as_str())))
		}
	);

	if op.is_resource_scoped() {
		out.push_str("  scope and ownership: evaluated per resource\n");
	}
	let _ = writeln!(out, "  decision: {decision}");
	(decision, out)
}

fn pass(ok: bool) -> &'static str {
	if ok {
		"pass"
	} else {
		"fail"
	}
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
	items.collect::<Vec<_>>().join(", ")
}
