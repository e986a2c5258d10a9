//! Action outcomes.
//!
//! Every ledger action is a sequence of independent store calls. Once the
//! primary row is written the action has succeeded; later steps that fail
//! are collected here instead of being rolled back or hidden.

use std::fmt;

use serde::Serialize;

/// Step of an action that can fail without failing the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ConsumeComponent,
    ReturnComponent,
    RecordShot,
    BatchRemaining,
    FirearmRoundCount,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ConsumeComponent => "consume component",
            Step::ReturnComponent => "return component",
            Step::RecordShot => "record shot",
            Step::BatchRemaining => "batch remaining count",
            Step::FirearmRoundCount => "firearm round count",
        }
    }
}

/// A secondary effect that did not apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub step: Step,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step.as_str(), self.message)
    }
}

/// Result of an action whose primary write succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> ActionOutcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    /// True when every secondary effect applied.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionOutcome<U> {
        ActionOutcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// Accumulates warnings while an action runs.
#[derive(Debug, Default)]
pub(crate) struct WarningLog {
    warnings: Vec<Warning>,
}

impl WarningLog {
    pub(crate) fn push(&mut self, step: Step, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(step = step.as_str(), %message, "secondary effect failed");
        self.warnings.push(Warning { step, message });
    }

    pub(crate) fn finish<T>(self, value: T) -> ActionOutcome<T> {
        ActionOutcome::with_warnings(value, self.warnings)
    }
}
