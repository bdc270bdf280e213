use crate::agent::executor::{generate_sql_query, RetryPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::llm::client::ChatCompletionsClient;
use crate::llm::provider::LlmProvider;
use crate::loader::load_table;
use crate::schema::sql::generate_schema;
use crate::store::{ResultRow, SqlStore, SqliteStore};
use crate::table::{clean_table, CleanTable, Table};
use crate::validator::{rows_to_json, DataValidator, ModelValidator, ValidatedRow};
use std::path::Path;
use std::sync::Arc;

/// what `run` returns when anything along the pipeline fails
pub const EMPTY_RESULT: &str = "[]";

/// file + question in, validated json rows out
pub struct TextToSql {
    config: Config,
    provider: Arc<dyn LlmProvider>,
    store: Box<dyn SqlStore>,
    validator: Box<dyn DataValidator>,
}

impl TextToSql {
    pub fn new(
        config: Config,
        provider: Arc<dyn LlmProvider>,
        store: Box<dyn SqlStore>,
        validator: Box<dyn DataValidator>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            validator,
        }
    }

    /// chat completions client, sqlite store and the model validator
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = Arc::new(ChatCompletionsClient::from_config(&config));
        Self::with_provider(config, provider)
    }

    /// sqlite store and model validator around any provider.
    /// without a configured database path the store is private to this pipeline
    pub fn with_provider(config: Config, provider: Arc<dyn LlmProvider>) -> Result<Self> {
        config.validate()?;

        let store = match &config.database_path {
            Some(path) => SqliteStore::new(path.clone()),
            None => SqliteStore::temporary()?,
        };

        Ok(Self::new(config, provider, Box::new(store), Box::new(ModelValidator)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// always returns a json array; failures are logged and become `[]`
    pub async fn run(&self, path: &Path, user_prompt: &str) -> String {
        let outcome = self
            .try_run(path, user_prompt)
            .await
            .and_then(|rows| rows_to_json(&rows));

        match outcome {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("error extracting data from {}: {}", path.display(), e);
                EMPTY_RESULT.to_string()
            }
        }
    }

    /// same pipeline as `run`, but failures are returned instead of swallowed
    #[tracing::instrument(skip(self, path, user_prompt), fields(path = %path.display()))]
    pub async fn try_run(&self, path: &Path, user_prompt: &str) -> Result<Vec<ValidatedRow>> {
        let table = load_table(path)?;
        self.try_run_table(table, user_prompt).await
    }

    /// pipeline from cleaning onward, for callers that already hold a table
    pub async fn try_run_table(&self, table: Table, user_prompt: &str) -> Result<Vec<ValidatedRow>> {
        let cleaned = clean_table(table)?;
        let schema = self.create_table_and_schema(&cleaned)?;

        let results = self.generate_and_execute(user_prompt, &schema).await;
        self.discard_table();
        let results = results?;

        self.validate_results(&cleaned, &results)
    }

    #[tracing::instrument(skip(self, table), fields(table = %self.config.table_name))]
    fn create_table_and_schema(&self, table: &CleanTable) -> Result<String> {
        self.store.create_table(table, &self.config.table_name)?;
        Ok(generate_schema(table, &self.config.table_name))
    }

    async fn generate_and_execute(&self, user_prompt: &str, schema: &str) -> Result<Vec<ResultRow>> {
        let policy = RetryPolicy::from_config(&self.config);
        let query = generate_sql_query(self.provider.as_ref(), user_prompt, schema, &policy).await?;

        self.store.execute(&query)
    }

    fn validate_results(&self, table: &CleanTable, results: &[ResultRow]) -> Result<Vec<ValidatedRow>> {
        let model = self.validator.create_model(table);
        let raw = serde_json::to_string(results)?;

        Ok(self.validator.validate(&raw, &model))
    }

    fn discard_table(&self) {
        if let Err(e) = self.store.drop_table(&self.config.table_name) {
            tracing::warn!("failed to drop table {}: {}", self.config.table_name, e);
        }
    }
}
