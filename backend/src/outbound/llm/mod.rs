//! Chat model outbound adapters.
//!
//! This module provides an HTTP implementation of the `ChatModel` port for
//! OpenAI-compatible chat-completions providers such as OpenRouter.

mod dto;
mod http_model;

pub use http_model::{
    DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL, LlmSettings, LlmSetupError,
    OpenAiCompatibleChatModel, RetryPolicy,
};
