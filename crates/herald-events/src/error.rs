//! Dispatcher and runner error types

use std::time::Duration;
use thiserror::Error;

use crate::listener::ListenerId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("the same listener cannot be added twice for {event_type}")]
    DuplicateCallback { event_type: &'static str },

    #[error("listener id {id} is already registered for {event_type}")]
    DuplicateId {
        id: ListenerId,
        event_type: &'static str,
    },

    #[error("listener id cannot be zero")]
    InvalidListenerId,

    #[error("listener ids exhausted")]
    IdsExhausted,

    #[error("listener set for {event_type} holds a different event type")]
    SetTypeMismatch { event_type: &'static str },
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("listener panicked: {0}")]
    ListenerPanicked(String),

    #[error("runner shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
