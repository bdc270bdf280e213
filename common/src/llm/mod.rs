pub mod client;
pub mod model;
pub mod provider;

pub use client::ChatCompletionsClient;
pub use model::{Message, MessageRole, ModelConfig};
pub use provider::LlmProvider;
