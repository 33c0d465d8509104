//! Classifies newly opened GitHub issues with a language model and labels them.
//!
//! Each `issues` event runs Classify -> Route -> Execute once (see
//! [`workflow::WorkflowEngine`]). The classifier and the label sink are
//! traits so transports and tests can swap them out.

pub mod classifier;
pub mod config;
pub mod error;
pub mod lambda;
pub mod platform;
pub mod server;
pub mod shutdown;
pub mod webhook;
pub mod workflow;
