use crate::error::Result;
use crate::llm::model::Message;
use async_trait::async_trait;

/// a chat model behind some transport. implementations report throttling
/// as `Text2SqlError::RateLimited` and every other failure as `Transport`
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, messages: Vec<Message>) -> Result<String>;
}
