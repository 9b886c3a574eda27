use crate::dose::DoseType;
use thiserror::Error;

/// Failure to materialize a history record from raw bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("insufficient data: record needs {needed} bytes, {available} available")]
    InsufficientData { needed: usize, available: usize },
}

/// Contract violations when building a progress estimator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("cannot estimate progress for {0:?} doses; only boluses and basal rates pulse")]
    InvalidDoseKind(DoseType),
    #[error("invalid delivery rate: {0}")]
    InvalidRate(&'static str),
}
