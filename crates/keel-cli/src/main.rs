// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `keel-authz`: inspect the access policy and run decisions against a database.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use keel_server_auth::{OrgId, PolicyEngine, Role};
use keel_server_config::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod live;
mod policy;

#[derive(Parser, Debug)]
#[command(name = "keel-authz", about = "Keel access policy tool", version)]
struct Args {
	/// Config file; defaults to /etc/keel/server.toml
	#[arg(long, global = true, env = "KEEL_SERVER_CONFIG")]
	config: Option<PathBuf>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the role × permission matrix in effect
	Matrix {
		#[arg(long)]
		json: bool,
	},
	/// List every operation with its access requirements
	Operations,
	/// Walk the role and permission gates of an operation for a role
	Explain {
		/// Operation name, e.g. `task.update`
		operation: String,
		#[arg(long)]
		role: Role,
	},
	/// Create or upgrade the database schema
	Migrate,
	/// Show the organizations visible from an organization
	Scope { org: OrgId },
	/// Authorize an operation as an existing user
	Check {
		operation: String,
		/// Email of the acting user
		#[arg(long = "as")]
		email: String,
		/// Target resource id for single-resource operations
		#[arg(long)]
		resource: Option<Uuid>,
	},
	/// Show recent audit entries
	Audit {
		/// Only entries by this user
		#[arg(long)]
		user: Option<String>,
	},
}

fn load_config(args: &Args) -> Result<ServerConfig> {
	let config = match &args.config {
		Some(path) => keel_server_config::load_config_with_file(path)?,
		None => keel_server_config::load_config()?,
	};
	Ok(config)
}

fn init_tracing(level: &str, json: bool) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| level.to_string().into());
	let registry = tracing_subscriber::registry().with(filter);
	if json {
		registry
			.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init();
	}
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let args = Args::parse();
	let config = load_config(&args)?;
	init_tracing(&config.logging.level, args.json_logs);

	match args.command {
		Command::Matrix { json } => {
			let map = &config.authz.role_permissions;
			if json {
				println!("{}", policy::matrix_json(map)?);
			} else {
				print!("{}", policy::render_matrix(map));
			}
		}
		Command::Operations => print!("{}", policy::render_operations()),
		Command::Explain { operation, role } => {
			let op = policy::find_operation(&operation)?;
			let engine = PolicyEngine::new(config.authz.role_permissions.clone());
			let (decision, text) = policy::explain(&engine, op, role);
			print!("{text}");
			if !decision.is_allowed() {
				return Ok(ExitCode::from(2));
			}
		}
		Command::Migrate => {
			if config.database.is_in_memory() {
				tracing::warn!(database = %config.database.url, "in-memory database; schema will not persist");
			}
			live::connect(&config.database).await?;
			tracing::info!(database = %config.database.url, "schema up to date");
		}
		Command::Scope { org } => {
			let pool = live::connect(&config.database).await?;
			print!("{}", live::scope(&pool, &config.authz, org).await?);
		}
		Command::Check {
			operation,
			email,
			resource,
		} => {
			let pool = live::connect(&config.database).await?;
			let request = live::CheckRequest {
				operation: policy::find_operation(&operation)?,
				email: &email,
				resource,
			};
			match live::check(&pool, &config.authz, request).await? {
				live::Verdict::Allow(message) => println!("{message}"),
				live::Verdict::Deny(message) => {
					println!("{message}");
					return Ok(ExitCode::from(2));
				}
			}
		}
		Command::Audit { user } => {
			let pool = live::connect(&config.database).await?;
			print!("{}", live::audit(&pool, user.as_deref()).await?);
		}
	}

	Ok(ExitCode::SUCCESS)
}
