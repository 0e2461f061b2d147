//! Weather tool — stub that returns fixed demo data.
//!
//! Tokyo, San Francisco and Paris have canned readings; any other location
//! reports an unknown temperature. Useful for exercising the tool-calling
//! loop end-to-end without network access.

use agentloom_core::error::ToolError;
use agentloom_core::tool::{Tool, ToolOutput};
use async_trait::async_trait;

pub struct WeatherTool;

#[derive(Debug, PartialEq, serde::Serialize)]
struct Reading {
    location: String,
    temperature: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'static str>,
}

fn lookup(location: &str) -> Reading {
    let lower = location.to_lowercase();
    let known = [
        ("tokyo", "Tokyo", "10", "celsius"),
        ("san francisco", "San Francisco", "72", "fahrenheit"),
        ("paris", "Paris", "22", "fahrenheit"),
    ];

    known
        .iter()
        .find(|(needle, ..)| lower.contains(needle))
        .map(|&(_, name, temperature, unit)| Reading {
            location: name.to_string(),
            temperature,
            unit: Some(unit),
        })
        .unwrap_or_else(|| Reading {
            location: location.to_string(),
            temperature: "unknown",
            unit: None,
        })
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather in a given location"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city and state, e.g. San Francisco, CA"
                },
                "unit": {
                    "type": "string",
                    "enum": ["celsius", "fahrenheit"]
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;

        let reading = lookup(location);
        let value = serde_json::to_value(&reading).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(ToolOutput::json(value))
    }
}
