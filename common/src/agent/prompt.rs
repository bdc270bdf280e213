pub const SQL_SYSTEM_PROMPT: &str =
    "you translate questions about a single sqlite table into sql. \
     output only the query text. no markdown, no commentary, no backticks.";

/// the user message: the question plus the create table statement as grounding
pub fn build_sql_prompt(user_prompt: &str, schema: &str) -> String {
    format!(
        "Generate a SQL query for the prompt \"{}\", based on the following table schema:\n\
         {}\n\n\
         Provide ONLY the query, without any explanation. I need to be able to copy paste it into a SQL engine.\n\
         Do not add any backticks and do not start with the word sql.",
        user_prompt, schema
    )
}
