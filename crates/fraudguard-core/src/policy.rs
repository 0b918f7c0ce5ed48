//! Policy enums selected through configuration.
//!
//! These make the error-handling choices of the pipeline explicit: how each
//! remote evaluator treats its own failure, whether the evaluators run
//! concurrently, and what happens to an inbound message whose pass failed.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// How an evaluator error (including a timeout) is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The error is logged and the verdict becomes `false`.
    FailOpen,
    /// The error aborts the pipeline for the work item.
    FailClosed,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(FailurePolicy::FailOpen),
            "fail_closed" | "closed" => Ok(FailurePolicy::FailClosed),
            _ => Err(anyhow::anyhow!("Invalid failure policy: {}", s)),
        }
    }
}

impl Display for FailurePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailurePolicy::FailOpen => write!(f, "fail_open"),
            FailurePolicy::FailClosed => write!(f, "fail_closed"),
        }
    }
}

/// Whether the three evaluators run concurrently or one after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    #[default]
    Concurrent,
    /// AI inference, then identity history, then content heuristic.
    Sequential,
}

impl FromStr for EvaluationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concurrent" | "parallel" => Ok(EvaluationMode::Concurrent),
            "sequential" => Ok(EvaluationMode::Sequential),
            _ => Err(anyhow::anyhow!("Invalid evaluation mode: {}", s)),
        }
    }
}

impl Display for EvaluationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EvaluationMode::Concurrent => write!(f, "concurrent"),
            EvaluationMode::Sequential => write!(f, "sequential"),
        }
    }
}

/// What the consumer does with an inbound message whose pipeline pass failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDisposition {
    /// Log and delete the message.
    #[default]
    Drop,
    /// Leave the message on the queue so it is delivered again.
    Redeliver,
    /// Forward the message body to the dead-letter queue, then delete it.
    DeadLetter,
}

impl FromStr for FailureDisposition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "drop" => Ok(FailureDisposition::Drop),
            "redeliver" | "retry" => Ok(FailureDisposition::Redeliver),
            "dead_letter" | "dlq" => Ok(FailureDisposition::DeadLetter),
            _ => Err(anyhow::anyhow!("Invalid failure disposition: {}", s)),
        }
    }
}

impl Display for FailureDisposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailureDisposition::Drop => write!(f, "drop"),
            FailureDisposition::Redeliver => write!(f, "redeliver"),
            FailureDisposition::DeadLetter => write!(f, "dead_letter"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(
            "fail_open".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::FailOpen
        );
        assert_eq!(
            "Fail-Closed".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::FailClosed
        );
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_failure_policy_display_roundtrip() {
        for policy in [FailurePolicy::FailOpen, FailurePolicy::FailClosed] {
            assert_eq!(policy.to_string().parse::<FailurePolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_evaluation_mode_parse() {
        assert_eq!(
            "sequential".parse::<EvaluationMode>().unwrap(),
            EvaluationMode::Sequential
        );
        assert_eq!(EvaluationMode::default(), EvaluationMode::Concurrent);
        assert!("random".parse::<EvaluationMode>().is_err());
    }

    #[test]
    fn test_failure_disposition_parse() {
        assert_eq!(
            "dead-letter".parse::<FailureDisposition>().unwrap(),
            FailureDisposition::DeadLetter
        );
        assert_eq!(
            "redeliver".parse::<FailureDisposition>().unwrap(),
            FailureDisposition::Redeliver
        );
        assert_eq!(FailureDisposition::default(), FailureDisposition::Drop);
    }
}
