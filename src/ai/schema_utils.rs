use serde::Serialize;
use serde_json::{Map, Value, json};

/// Turns a schemars root schema into a self-contained document for a prompt.
///
/// `$ref`s are inlined from `definitions`, and metadata the model has no use
/// for (`$schema`, `title`, `definitions`) is dropped.
pub fn clean_schema<T: Serialize>(root: T) -> serde_json::Result<Value> {
    let mut root_val = serde_json::to_value(root)?;

    let definitions = root_val
        .get("definitions")
        .or_else(|| root_val.get("$defs"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    process_schema_node(&mut root_val, &definitions, 0);

    if let Value::Object(ref mut map) = root_val {
        map.remove("definitions");
        map.remove("$defs");
    }

    Ok(root_val)
}

pub fn schema_text<T: Serialize>(root: T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&clean_schema(root)?)
}

fn process_schema_node(node: &mut Value, definitions: &Map<String, Value>, depth: usize) {
    if depth > 16 {
        *node = json!({ "type": "object" });
        return;
    }

    // A bare `$ref` or a single-element `allOf` wrapping one.
    let mut hops = 0;
    while let Some(target) = ref_target(node) {
        hops += 1;
        let name = target.rsplit('/').next().unwrap_or_default();
        match definitions.get(name) {
            Some(def) if hops <= 8 => *node = merge_ref(node, def),
            _ => {
                *node = json!({ "type": "object" });
                break;
            }
        }
    }

    let Value::Object(map) = node else {
        return;
    };

    map.remove("$schema");
    map.remove("$id");
    map.remove("title");

    // `["string", "null"]` reads better to a model as the plain type.
    if let Some(Value::Array(types)) = map.get("type") {
        let non_null: Vec<Value> = types.iter().filter(|t| t.as_str() != Some("null")).cloned().collect();
        if non_null.len() == 1 {
            map.insert("type".into(), non_null[0].clone());
        }
    }

    if let Some(Value::Object(props)) = map.get_mut("properties") {
        for val in props.values_mut() {
            process_schema_node(val, definitions, depth + 1);
        }
    }
    if let Some(val) = map.get_mut("items") {
        process_schema_node(val, definitions, depth + 1);
    }
    for key in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(arr)) = map.get_mut(key) {
            for item in arr.iter_mut() {
                process_schema_node(item, definitions, depth + 1);
            }
        }
    }

    // schemars emits `anyOf: [X, {type: null}]` for Option<X>.
    if let Some(Value::Array(arr)) = map.get("anyOf") {
        let non_null: Vec<Value> = arr
            .iter()
            .filter(|v| v.get("type") != Some(&json!("null")))
            .cloned()
            .collect();
        if non_null.len() == 1 {
            if let Value::Object(inner) = &non_null[0] {
                map.remove("anyOf");
                for (k, v) in inner {
                    map.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }
    }
}

fn ref_target(node: &Value) -> Option<String> {
    let map = node.as_object()?;
    if let Some(target) = map.get("$ref").and_then(Value::as_str) {
        return Some(target.to_string());
    }
    match map.get("allOf").and_then(Value::as_array) {
        Some(all) if all.len() == 1 => all[0].get("$ref").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Replaces the reference with its definition, keeping sibling keywords
/// such as `description` written at the point of use.
fn merge_ref(node: &Value, def: &Value) -> Value {
    let mut merged = def.clone();
    if let (Some(site), Value::Object(target)) = (node.as_object(), &mut merged) {
        for (k, v) in site {
            if k != "$ref" && k != "allOf" {
                target.insert(k.clone(), v.clone());
            }
        }
    }
    merged
}
