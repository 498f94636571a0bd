// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Feedback events. Ephemeral: consumed by the feedback learner and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::issue::IssueIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackOutcome {
    Positive,
    Negative,
}

impl fmt::Display for FeedbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackOutcome::Positive => f.write_str("positive"),
            FeedbackOutcome::Negative => f.write_str("negative"),
        }
    }
}

impl FromStr for FeedbackOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "helpful" | "up" => Ok(FeedbackOutcome::Positive),
            "negative" | "unhelpful" | "down" => Ok(FeedbackOutcome::Negative),
            other => Err(format!("unknown feedback outcome '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    #[serde(flatten)]
    pub issue: IssueIdentity,
    pub outcome: FeedbackOutcome,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("Positive".parse::<FeedbackOutcome>().unwrap(), FeedbackOutcome::Positive);
        assert_eq!("down".parse::<FeedbackOutcome>().unwrap(), FeedbackOutcome::Negative);
        assert!("maybe".parse::<FeedbackOutcome>().is_err());
    }

    #[test]
    fn test_event_deserializes_flat_payload() {
        let event: FeedbackEvent = serde_json::from_value(serde_json::json!({
            "category": "datenschutz",
            "title": "Fehlende Datenschutzerklärung",
            "description": "keine Seite gefunden",
            "outcome": "negative"
        }))
        .unwrap();
        assert_eq!(event.outcome, FeedbackOutcome::Negative);
        assert_eq!(event.issue.category, "datenschutz");
    }
}
