//! System prompt presenting the capability catalogue as a constrained choice.

use crate::capability::CapabilityRegistry;

const OUTPUT_CONTRACT: &str = r#"{
    "tool_calls": [
        {
            "name": "function_name",
            "arguments": {
                "param1": "value1",
                "param2": "value2"
            }
        }
    ]
}"#;

/// Build the system prompt for a registry.
///
/// Capabilities appear in registration order, so the same registry always
/// yields byte-identical prompt text.
pub fn build_system_prompt(registry: &CapabilityRegistry) -> String {
    let catalogue = serde_json::Value::Array(registry.to_tool_definitions());
    // Serializing a Value cannot fail.
    let catalogue = serde_json::to_string_pretty(&catalogue).unwrap_or_default();

    format!(
        "You are an AI assistant that helps with function calling.\n\
         Available functions: {catalogue}\n\
         \n\
         Rules:\n\
         1. ONLY use the functions listed above. Never call a function that is not listed.\n\
         2. If a function requires parameters, make sure to provide them.\n\
         3. Return response in this exact JSON format, with no other text:\n\
         {OUTPUT_CONTRACT}\n\
         4. If none of the functions apply, return {{\"tool_calls\": []}}.\n"
    )
}
