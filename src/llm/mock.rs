//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns, plus a
//! forced-empty mode for exercising the generation failure path.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing without making real API calls.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every completion returns an empty string.
    always_empty: bool,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes every completion come back empty.
    pub fn with_empty_responses(mut self) -> Self {
        self.always_empty = true;
        self
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> String {
        if self.always_empty {
            return String::new();
        }

        let input_lower = input.to_lowercase();

        // Check custom responses first
        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        // Default pattern matching over the demo analytics schema
        if input_lower.contains("all customers") || input_lower.contains("list customers") {
            return "```sql\nSELECT id, name, email FROM customers\n```".to_string();
        }

        if input_lower.contains("count") && input_lower.contains("orders") {
            return "```sql\nSELECT COUNT(*) FROM orders\n```".to_string();
        }

        if input_lower.contains("most orders") {
            return "```sql\nSELECT c.name, COUNT(o.id) AS order_count\nFROM customers c\nJOIN orders o ON o.customer_id = c.id\nGROUP BY c.name\nORDER BY order_count DESC\nLIMIT 1\n```"
                .to_string();
        }

        if input_lower.contains("delete") {
            return "```sql\nDELETE FROM customers\n```".to_string();
        }

        "```sql\nSELECT id, name FROM customers\n```".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }

    fn endpoint(&self) -> String {
        "mock://local".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_response_is_sql() {
        let client = MockLlmClient::new();
        let response = client
            .complete(&[Message::user("List customers")])
            .await
            .unwrap();
        assert!(response.contains("SELECT"));
    }

    #[tokio::test]
    async fn test_custom_response_takes_priority() {
        let client = MockLlmClient::new().with_response("revenue", "```sql\nSELECT SUM(total_amount) FROM orders\n```");
        let response = client
            .complete(&[Message::user("What is our total revenue?")])
            .await
            .unwrap();
        assert!(response.contains("SUM(total_amount)"));
    }

    #[tokio::test]
    async fn test_empty_mode() {
        let client = MockLlmClient::new().with_empty_responses();
        let response = client
            .complete(&[Message::user("List customers")])
            .await
            .unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_uses_last_user_message() {
        let client = MockLlmClient::new();
        let messages = vec![
            Message::system("instructions"),
            Message::user("count of orders"),
        ];
        let response = client.complete(&messages).await.unwrap();
        assert!(response.contains("COUNT(*)"));
    }
}
