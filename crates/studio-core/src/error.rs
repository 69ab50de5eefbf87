use crate::audio::NodeId;
use thiserror::Error;

/// Failures raised by an [`AudioBackend`](crate::AudioBackend).
///
/// `Unavailable` is the only one that reaches the user; the rest are logged by
/// the synthesis layer and absorbed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("audio subsystem unavailable: {0}")]
    Unavailable(String),
    #[error("audio node {0:?} is in an invalid state: {1}")]
    InvalidState(NodeId, &'static str),
    #[error("unknown audio node {0:?}")]
    UnknownNode(NodeId),
    #[error("audio backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("analysis tap is not attached yet")]
    NotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("render loop started while already running")]
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(String),
    #[error("gpu error: {0}")]
    Gpu(String),
}
