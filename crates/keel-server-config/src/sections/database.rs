// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration. Keel stores everything in a single SQLite database.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_URL: &str = "sqlite:./keel.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
		}
	}
}

impl DatabaseConfig {
	/// True for `sqlite::memory:` and `mode=memory` URLs, whose schema and
	/// data vanish with the pool.
	pub fn is_in_memory(&self) -> bool {
		self.url.contains(":memory:") || self.url.contains("mode=memory")
	}

	/// Only SQLite URLs are supported.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.url.strip_prefix("sqlite:") {
			Some(rest) if !rest.is_empty() => Ok(()),
			_ => Err(ConfigError::Validation(format!(
				"database.url must be a sqlite: URL naming a file or :memory:, got '{}'",
				self.url
			))),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
		}
	}
}
