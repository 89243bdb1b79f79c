use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Types the model can be forced to answer with.
///
/// Implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Tool input schema with nested definitions inlined.
    fn input_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = match &mut value {
            serde_json::Value::Object(map) => {
                map.remove("$schema");
                map.remove("title");
                map.remove("definitions")
            }
            _ => None,
        };
        if let Some(serde_json::Value::Object(defs)) = definitions {
            inline_refs(&mut value, &defs);
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn inline_refs(
    value: &mut serde_json::Value,
    defs: &serde_json::Map<String, serde_json::Value>,
) {
    match value {
        serde_json::Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(|r| r.as_str())
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| defs.get(name))
                .cloned();
            if let Some(mut resolved) = target {
                inline_refs(&mut resolved, defs);
                *value = resolved;
                return;
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, defs);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, defs);
            }
        }
        _ => {}
    }
}
