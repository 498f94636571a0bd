// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Structured Issue (Ingress Boundary)
//!
//! The scanner hands us loosely-typed JSON payloads. They are checked exactly
//! once, here, and turned into a [`StructuredIssue`]. Every downstream component
//! works with the validated type and never re-interprets the raw payload.
//!
//! | Field | Rule |
//! |-------|------|
//! | `category` | required, non-blank, ≤ 100 chars, normalized to lowercase |
//! | `title` | required, non-blank, ≤ 500 chars |
//! | `description` | optional (defaults to empty), ≤ 5000 chars |
//! | `context` | optional JSON object, opaque to the pipeline |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Normalized issue category (trimmed, lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueCategory(String);

impl IssueCategory {
    pub fn new(raw: &str) -> Result<Self, IssueError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IssueError::MissingField("category"));
        }
        if normalized.chars().count() > MAX_CATEGORY_LEN {
            return Err(IssueError::TooLong {
                field: "category",
                max: MAX_CATEGORY_LEN,
            });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A detected compliance problem, validated at the ingress boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIssue {
    pub category: IssueCategory,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// The part of an issue that determines cache identity.
///
/// Feedback intake only ever carries this triple, so it gets its own type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueIdentity {
    pub category: String,
    pub title: String,
    pub description: String,
}

/// Raw scanner payload. Field aliases cover the naming variants the scanner emits.
#[derive(Debug, Deserialize)]
struct RawIssue {
    #[serde(alias = "type", alias = "issue_type")]
    category: Option<Value>,
    #[serde(alias = "name")]
    title: Option<Value>,
    #[serde(alias = "details")]
    description: Option<Value>,
    context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    #[error("Issue payload must be a JSON object")]
    NotAnObject,

    #[error("Missing or blank field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field '{field}' exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// The object could not be read as an issue, e.g. `category` and its
    /// alias `type` both present.
    #[error("Malformed issue payload: {0}")]
    Malformed(String),
}

impl StructuredIssue {
    /// Build an issue from already-typed parts, applying the same checks as ingress.
    pub fn new(
        category: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, IssueError> {
        let title = title.into();
        let description = description.into();
        check_title(&title)?;
        check_description(&description)?;
        Ok(Self {
            category: IssueCategory::new(category)?,
            title,
            description,
            context: Map::new(),
        })
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Validate a raw scanner payload.
    pub fn from_value(value: Value) -> Result<Self, IssueError> {
        if !value.is_object() {
            return Err(IssueError::NotAnObject);
        }
        let raw: RawIssue =
            serde_json::from_value(value).map_err(|e| IssueError::Malformed(e.to_string()))?;

        let category = required_string(raw.category, "category")?;
        let title = required_string(raw.title, "title")?;
        let description = match raw.description {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(IssueError::WrongType {
                    field: "description",
                    expected: "string",
                })
            }
        };
        let context = match raw.context {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(IssueError::WrongType {
                    field: "context",
                    expected: "object",
                })
            }
        };

        Ok(Self::new(&category, title, description)?.with_context(context))
    }

    pub fn identity(&self) -> IssueIdentity {
        IssueIdentity {
            category: self.category.as_str().to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

fn required_string(value: Option<Value>, field: &'static str) -> Result<String, IssueError> {
    match value {
        None | Some(Value::Null) => Err(IssueError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(IssueError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(IssueError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn check_title(title: &str) -> Result<(), IssueError> {
    if title.trim().is_empty() {
        return Err(IssueError::MissingField("title"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(IssueError::TooLong {
            field: "title",
            max: MAX_TITLE_LEN,
        });
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), IssueError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(IssueError::TooLong {
            field: "description",
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}
