//! The dispatch orchestration engine.
//!
//! [`Dispatcher::dispatch`] takes one inbound message, classifies it, resolves
//! the user's conversation thread, drives a run to completion against the
//! selected handler, and executes any tool calls the handler requests along
//! the way. The caller always gets a [`DispatchOutcome`] — never a panic,
//! never a bare error.

pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod router;

pub use {
    classifier::{Classifier, MessageClassifier},
    dispatcher::{DispatchOutcome, Dispatcher},
    error::DispatchError,
    router::ToolRouter,
};
