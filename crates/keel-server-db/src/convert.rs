// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column decoding shared by the repositories. IDs and timestamps are stored
//! as text.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_id<T: From<Uuid>>(value: &str, column: &str) -> Result<T, DbError> {
	Uuid::parse_str(value)
		.map(T::from)
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn parse_opt_id<T: From<Uuid>>(
	value: Option<String>,
	column: &str,
) -> Result<Option<T>, DbError> {
	value.map(|v| parse_id(&v, column)).transpose()
}

pub(crate) fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn parse_enum<T>(value: &str, column: &str) -> Result<T, DbError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}
