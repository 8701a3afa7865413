use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys Gemini's `responseSchema` understands; everything else is dropped.
const ALLOWED_KEYS: &[&str] = &[
    "type",
    "format",
    "description",
    "nullable",
    "enum",
    "properties",
    "required",
    "items",
    "minItems",
    "maxItems",
];

/// Types that can be requested from the model as structured JSON output.
///
/// Implemented for every `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Gemini-compatible schema for this type:
    /// 1. `$ref`s inlined, `definitions` removed
    /// 2. `type: [T, "null"]` rewritten to `type: T, nullable: true`
    /// 3. type names upper-cased (`STRING`, `OBJECT`, ...)
    fn response_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => map.remove("definitions").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        inline_refs(&mut value, &definitions, 0);
        sanitize(&mut value);
        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Parses model output as `T`, tolerating a surrounding markdown code fence.
pub fn parse_structured<T: StructuredOutput>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn inline_refs(value: &mut Value, definitions: &Value, depth: usize) {
    // recursive types would never terminate
    if depth > 32 {
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                let name = ref_path.trim_start_matches("#/definitions/");
                if let Some(def) = definitions.get(name) {
                    let mut resolved = def.clone();
                    inline_refs(&mut resolved, definitions, depth + 1);
                    map.remove("$ref");
                    if let Value::Object(def_map) = resolved {
                        for (k, v) in def_map {
                            map.entry(k).or_insert(v);
                        }
                    }
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions, depth + 1);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, definitions, depth + 1);
            }
        }
        _ => {}
    }
}

fn sanitize(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    // schemars renders single-variant `allOf` wrappers around documented refs
    if let Some(Value::Array(mut parts)) = map.remove("allOf") {
        if parts.len() == 1 {
            if let Value::Object(inner) = parts.remove(0) {
                for (k, v) in inner {
                    map.entry(k).or_insert(v);
                }
            }
        }
    }

    if let Some(Value::Array(types)) = map.get("type").cloned() {
        let concrete: Vec<&Value> = types.iter().filter(|t| t.as_str() != Some("null")).collect();
        if let Some(first) = concrete.first() {
            map.insert("type".to_string(), (*first).clone());
        }
        if concrete.len() < types.len() {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
    }

    if let Some(Value::String(ty)) = map.get("type").cloned() {
        map.insert("type".to_string(), Value::String(ty.to_uppercase()));
    }

    map.retain(|key, _| ALLOWED_KEYS.contains(&key.as_str()));

    if let Some(Value::Object(props)) = map.get_mut("properties") {
        for (_, prop) in props.iter_mut() {
            sanitize(prop);
        }
    }
    if let Some(items) = map.get_mut("items") {
        sanitize(items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ItemListing, JobPostings, SearchResultSet};

    #[test]
    fn test_item_listing_schema_lists_every_field() {
        let schema = ItemListing::response_schema();

        assert_eq!(schema["type"], "OBJECT");
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
        for field in ["name", "price", "brand", "stock", "description", "url"] {
            assert_eq!(schema["properties"][field]["type"], "STRING", "field {}", field);
        }
        assert_eq!(schema["required"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_nested_refs_are_inlined() {
        let schema = JobPostings::response_schema();

        let posting = &schema["properties"]["items"]["items"];
        assert_eq!(posting["type"], "OBJECT");
        assert_eq!(posting["properties"]["work_mode"]["type"], "STRING");
        assert!(schema.get("definitions").is_none());
        assert!(!schema.to_string().contains("$ref"));
    }

    #[test]
    fn test_optional_fields_become_nullable() {
        let schema = SearchResultSet::response_schema();

        let item = &schema["properties"]["items"]["items"];
        assert_eq!(item["properties"]["url"]["type"], "STRING");
        assert_eq!(item["properties"]["title"]["type"], "STRING");
        assert_eq!(item["properties"]["title"]["nullable"], true);
        assert!(item["properties"]["title"].get("default").is_none());
    }

    #[test]
    fn test_parse_structured_strips_code_fence() {
        let raw = "```json\n{\"items\": [{\"url\": \"https://siteA.com/x\"}]}\n```";
        let set: SearchResultSet = parse_structured(raw).unwrap();
        assert_eq!(set.items.len(), 1);

        let plain: SearchResultSet = parse_structured("{\"items\": []}").unwrap();
        assert!(plain.items.is_empty());

        assert!(parse_structured::<SearchResultSet>("I found three shops").is_err());
    }
}
