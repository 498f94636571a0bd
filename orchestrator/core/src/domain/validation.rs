// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Artifact Validation Domain
//!
//! Validation is a pure judgment: it never mutates the artifact and never
//! talks to the outside world. Its verdict is a [`ValidationReport`] made of
//! findings, split into hard errors (the artifact must not be trusted) and
//! warnings (the artifact is usable but worth a second look).
//!
//! | Check | Applies to | Severity |
//! |-------|-----------|----------|
//! | `structure` | all | error |
//! | `markup` | code, widget | error |
//! | `placeholder` | all (content only) | error |
//! | `topic_coverage` | text | warning |
//! | `length` | text | warning |
//! | `guide_steps` | guide | warning |

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCheck {
    Structure,
    Markup,
    Placeholder,
    TopicCoverage,
    Length,
    GuideSteps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub check: ValidationCheck,
    pub message: String,
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.check, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationFinding>,
    pub warnings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, check: ValidationCheck, message: impl Into<String>) {
        self.errors.push(ValidationFinding {
            check,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, check: ValidationCheck, message: impl Into<String>) {
        self.warnings.push(ValidationFinding {
            check,
            message: message.into(),
        });
    }

    pub fn has_error(&self, check: ValidationCheck) -> bool {
        self.errors.iter().any(|f| f.check == check)
    }

    /// Error messages, in the order they were found.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}
