//! LLM gateway client for meeting extraction, briefs, and roleplay chat.

mod client;

pub use client::{
    ChatMessage, CompletionBackend, CompletionParams, ContentStream, GatewayClient, GatewayConfig,
    LlmError,
};
