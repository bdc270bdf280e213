use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use common::config::{Config, DEFAULT_API_BASE, DEFAULT_MODEL_NAME, DEFAULT_TABLE_NAME};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "text2sql")]
#[command(about = "ask natural-language questions of csv, tsv and excel files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question about a data file and write the rows as JSON
    Query {
        /// Input data file (.csv, .tsv, .xlsx or .xls)
        #[arg(short, long)]
        input: PathBuf,

        /// Natural-language question about the data
        #[arg(short, long)]
        prompt: String,

        /// JSON output path (default: <input stem>.json next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Print the inferred CREATE TABLE statement and validation JSON Schema
    Schema {
        /// Input data file (.csv, .tsv, .xlsx or .xls)
        #[arg(short, long)]
        input: PathBuf,

        /// Table name used in the CREATE TABLE statement
        #[arg(long, default_value = DEFAULT_TABLE_NAME)]
        table_name: String,

        /// Also write the JSON Schema to this path
        #[arg(long)]
        json_schema_output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Chat model name
    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_MODEL_NAME)]
    model_name: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "TEXT2SQL_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// API key sent as a bearer token
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// SQLite database file holding the temporary table (default: a fresh temporary file per run)
    #[arg(long, env = "TEXT2SQL_DATABASE")]
    database: Option<PathBuf>,

    /// Attempts at SQL generation when rate limited
    #[arg(long, env = "TEXT2SQL_MAX_RETRIES", default_value = "3")]
    max_retries: usize,

    /// First backoff delay in seconds, doubled after each rate limit
    #[arg(long, env = "TEXT2SQL_INITIAL_DELAY_SECS", default_value = "1")]
    initial_delay_secs: u64,
}

impl ModelArgs {
    fn into_config(self) -> Config {
        let defaults = Config::default();

        Config {
            model_name: self.model_name,
            api_base: self.api_base,
            api_key: self.api_key.filter(|k| !k.is_empty()),
            database_path: self.database,
            table_name: defaults.table_name,
            max_retries: self.max_retries,
            initial_delay: Duration::from_secs(self.initial_delay_secs),
        }
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let _guard = common::tracing::init_tracing("text2sql")?;

        match self.command {
            Commands::Query {
                input,
                prompt,
                output,
                model,
            } => {
                run_query(input, prompt, output, model.into_config()).await;
                Ok(())
            }
            Commands::Schema {
                input,
                table_name,
                json_schema_output,
            } => print_schema(input, table_name, json_schema_output),
        }
    }
}

/// reports failures but never returns them
async fn run_query(input: PathBuf, prompt: String, output: Option<PathBuf>, config: Config) {
    use common::pipeline::{output_path_for, save_json_to_file, TextToSql};

    tracing::info!(model = %config.model_name, "running query against {}", input.display());

    let text_to_sql = match TextToSql::from_config(config) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("error initializing pipeline: {}", e);
            eprintln!("error: {}", e);
            return;
        }
    };

    let result = text_to_sql.run(&input, &prompt).await;
    println!("{}", result);

    let output = output.unwrap_or_else(|| output_path_for(&input));
    if let Err(e) = save_json_to_file(&result, &output) {
        tracing::error!("error saving json to {}: {}", output.display(), e);
        eprintln!("error: {}", e);
    }
}

fn print_schema(input: PathBuf, table_name: String, json_schema_output: Option<PathBuf>) -> Result<()> {
    use common::loader::load_table;
    use common::schema::{generate_schema, synthesize_model, to_json_schema};
    use common::table::clean_table;

    let table = clean_table(load_table(&input)?)?;
    let schema = generate_schema(&table, &table_name);
    let model = synthesize_model(&table);

    let title = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    let json_schema = serde_json::to_string_pretty(&to_json_schema(&model, Some(title))?)?;

    println!("{}\n\n{}", schema, json_schema);

    if let Some(path) = json_schema_output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &json_schema)?;
        tracing::info!(output = %path.display(), "wrote json schema");
    }

    Ok(())
}
