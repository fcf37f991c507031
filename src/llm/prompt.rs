//! Prompt construction for SQL generation requests.
//!
//! The schema text given to the LLM is static, versioned configuration: it
//! describes the analytics tables but is never validated against the live
//! database at request time.

use crate::llm::types::Message;

/// System prompt template for the SQL generator.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a SQL assistant for a PostgreSQL analytics database. Generate SQL queries based on user questions.

DATABASE SCHEMA:
{schema}

INSTRUCTIONS:
- Generate exactly one valid PostgreSQL SELECT statement
- Return ONLY the SQL query, no explanations
- Use appropriate JOINs based on foreign keys
- Never generate INSERT, UPDATE, DELETE, DDL, or multiple statements
- If the user asks in another language, still generate SQL against the English column names

OUTPUT FORMAT:
Return the SQL query wrapped in ```sql code blocks."#;

/// Built-in schema context for the demo analytics database.
///
/// Overridable via `query.schema_file` in the configuration.
pub const DEFAULT_SCHEMA_CONTEXT: &str = r#"TABLE customers (
    id bigint PRIMARY KEY,
    name varchar(255),
    email varchar(254) UNIQUE,
    registration_date timestamptz
)

TABLE products (
    id bigint PRIMARY KEY,
    name varchar(255),
    category varchar(120),
    price bigint
)

TABLE orders (
    id bigint PRIMARY KEY,
    customer_id bigint REFERENCES customers(id),
    product_id bigint REFERENCES products(id),
    order_date timestamptz,
    quantity integer,
    status varchar(20)  -- pending | completed | cancelled | refunded
)"#;

/// Builds the system prompt with the schema context injected.
pub fn build_system_prompt(schema: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{schema}", schema)
}

/// Builds the message list for one generation request.
///
/// The language hint travels with the question; it is generation context
/// only and never affects validation or execution.
pub fn build_messages(schema: &str, question: &str, language: &str) -> Vec<Message> {
    let user_content = if language.is_empty() || language == "en" {
        question.to_string()
    } else {
        format!("[language: {language}] {question}")
    };

    vec![
        Message::system(build_system_prompt(schema)),
        Message::user(user_content),
    ]
}
