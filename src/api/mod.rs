//! Client for the hosted risk assistant.

mod assistant_client;
mod types;

pub use assistant_client::{AssistantClient, AssistantConfig, GREETING};
