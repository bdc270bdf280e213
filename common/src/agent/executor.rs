use crate::agent::parser::extract_sql_query;
use crate::agent::prompt::{build_sql_prompt, SQL_SYSTEM_PROMPT};
use crate::config::{Config, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};
use crate::error::{Result, Text2SqlError};
use crate::llm::model::Message;
use crate::llm::provider::LlmProvider;
use std::time::Duration;

/// bounded exponential backoff, applied to rate limits only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// total attempts, including the first
    pub max_retries: usize,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.initial_delay,
        }
    }

    /// delay before attempt `attempt + 1`, doubling from the initial delay
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as u32;
        self.initial_delay.saturating_mul(1u32 << exponent)
    }
}

/// ask the model for a query against `schema`, backing off on rate limits
#[tracing::instrument(skip(provider, user_prompt, schema, policy), fields(llm.model = %provider.model_name(), max_retries = policy.max_retries))]
pub async fn generate_sql_query(
    provider: &dyn LlmProvider,
    user_prompt: &str,
    schema: &str,
    policy: &RetryPolicy,
) -> Result<String> {
    tracing::info!("generating sql query for prompt '{}'", user_prompt);

    let prompt = build_sql_prompt(user_prompt, schema);
    let mut last_error: Option<Text2SqlError> = None;

    for attempt in 1..=policy.max_retries {
        let messages = vec![Message::system(SQL_SYSTEM_PROMPT), Message::user(prompt.as_str())];

        match provider.complete(messages).await {
            Ok(output) => {
                let query = extract_sql_query(&output)?;
                tracing::info!("sql query generated on attempt {}: {}", attempt, query);
                return Ok(query);
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!("attempt {}/{} rate limited: {}", attempt, policy.max_retries, e);
                last_error = Some(e);

                if attempt < policy.max_retries {
                    let delay = policy.delay_after(attempt);
                    tracing::info!("retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                tracing::error!("error querying model {}: {}", provider.model_name(), e);
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        Text2SqlError::RateLimited(format!(
            "sql generation failed after {} attempts",
            policy.max_retries
        ))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// replays scripted responses and records when each call happened
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<Instant>>,
        prompts: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn delays(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, messages: Vec<Message>) -> Result<String> {
            self.calls.lock().unwrap().push(Instant::now());
            self.prompts.lock().unwrap().push(messages);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Text2SqlError::Transport("script exhausted".to_string())))
        }
    }

    fn rate_limited() -> Result<String> {
        Err(Text2SqlError::RateLimited("429".to_string()))
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = policy();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_rate_limits_with_backoff() {
        let provider = ScriptedProvider::new(vec![
            rate_limited(),
            rate_limited(),
            Ok("SELECT name FROM t".to_string()),
        ]);

        let query = generate_sql_query(&provider, "names", "CREATE TABLE t (name TEXT);", &policy())
            .await
            .unwrap();

        assert_eq!(query, "SELECT name FROM t");
        assert_eq!(provider.delays(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_rate_limit() {
        let provider = ScriptedProvider::new(vec![rate_limited(), rate_limited(), rate_limited()]);

        let result = generate_sql_query(&provider, "names", "schema", &policy()).await;

        assert!(matches!(result, Err(Text2SqlError::RateLimited(_))));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_not_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(Text2SqlError::Transport("401 unauthorized".to_string())),
            Ok("SELECT 1".to_string()),
        ]);

        let result = generate_sql_query(&provider, "names", "schema", &policy()).await;

        assert!(matches!(result, Err(Text2SqlError::Transport(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_embeds_request_and_schema() {
        let provider = ScriptedProvider::new(vec![Ok("```sql\nSELECT 1\n```".to_string())]);
        let schema = "CREATE TABLE t (name TEXT);";

        let query = generate_sql_query(&provider, "anything", schema, &policy()).await.unwrap();
        assert_eq!(query, "SELECT 1");

        let prompts = provider.prompts.lock().unwrap();
        let user = &prompts[0][1].content;
        assert!(user.contains("anything"));
        assert!(user.contains(schema));
    }
}
