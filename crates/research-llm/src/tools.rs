//! Tool definitions advertised to the model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name, description and JSON schema of a callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Small helpers for building JSON schemas
///
/// ```
/// use research_llm::tools::schema;
/// use serde_json::json;
///
/// let params = schema::object(
///     json!({
///         "ticker": schema::string("Ticker symbol, e.g. AAPL"),
///         "max_results": schema::integer("Number of articles"),
///     }),
///     &["ticker"],
/// );
/// assert_eq!(params["required"][0], "ticker");
/// ```
pub mod schema {
    use serde_json::{Value, json};

    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn string(description: &str) -> Value {
        json!({ "type": "string", "description": description })
    }

    pub fn integer(description: &str) -> Value {
        json!({ "type": "integer", "description": description })
    }

    pub fn number(description: &str) -> Value {
        json!({ "type": "number", "description": description })
    }
}
