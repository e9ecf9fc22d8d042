use std::fmt;

use crate::selection::types::ActionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorErrorKind {
    InvalidArgument,
    AmbiguousAction,
    ProviderFailure,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub kind: SelectorErrorKind,
    pub message: String,
    /// Tied descriptors when `kind` is `AmbiguousAction`, in provider order.
    pub candidates: Vec<ActionId>,
}

impl SelectorError {
    pub fn new(kind: SelectorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            candidates: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<ActionId>) -> Self {
        self.candidates = candidates;
        self
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.candidates.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (candidates: {})", self.message, self.candidates.join(", "))
        }
    }
}

impl std::error::Error for SelectorError {}

pub fn invalid_argument(message: impl Into<String>) -> SelectorError {
    SelectorError::new(SelectorErrorKind::InvalidArgument, message)
}

pub fn ambiguous_action(candidates: Vec<ActionId>) -> SelectorError {
    SelectorError::new(
        SelectorErrorKind::AmbiguousAction,
        format!("{} actions match the request equally well", candidates.len()),
    )
    .with_candidates(candidates)
}

pub fn provider_failure(message: impl Into<String>) -> SelectorError {
    SelectorError::new(SelectorErrorKind::ProviderFailure, message)
}

pub fn cancelled(message: impl Into<String>) -> SelectorError {
    SelectorError::new(SelectorErrorKind::Cancelled, message)
}
