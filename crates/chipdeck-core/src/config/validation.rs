//! Config validation - warns about unknown fields and malformed entity ids

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Validate JSON config and warn about anything suspicious.
pub fn warn_config_issues(content: &str, config_name: &str) {
    for path in unknown_fields(content) {
        warn!("Unknown config field in {config_name}: {path}");
    }
    for (path, entity) in invalid_entities(content) {
        warn!("Entity id in {config_name} at {path} is not domain.object: {entity}");
    }
}

/// Paths of unknown keys, like `backend.sockPath` or `chips[1].icn`.
///
/// Invalid JSON yields no paths; parsing reports it instead.
#[must_use]
pub fn unknown_fields(content: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };
    find_unknown_keys(&value, &expected_config_keys(), "")
}

/// Chip entity ids that do not look like `domain.object`, with their paths.
#[must_use]
pub fn invalid_entities(content: &str) -> Vec<(String, String)> {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };
    let Some(chips) = value.get("chips").and_then(Value::as_array) else {
        return Vec::new();
    };

    chips
        .iter()
        .enumerate()
        .filter_map(|(index, chip)| {
            let entity = chip.get("entity")?.as_str()?;
            (!is_entity_id(entity)).then(|| (format!("chips[{index}].entity"), entity.to_string()))
        })
        .collect()
}

fn is_entity_id(entity: &str) -> bool {
    entity
        .split_once('.')
        .is_some_and(|(domain, object)| !domain.is_empty() && !object.is_empty())
}

/// Find unknown keys in JSON value compared to expected keys.
fn find_unknown_keys(value: &Value, expected: &ExpectedKeys, prefix: &str) -> Vec<String> {
    let mut unknowns = Vec::new();

    let Value::Object(obj) = value else {
        return unknowns;
    };

    for (key, child) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        if let Some(nested) = expected.nested.get(key.as_str()) {
            unknowns.extend(find_unknown_keys(child, nested, &path));
        } else if let Some(items) = expected.items.get(key.as_str()) {
            if let Value::Array(elements) = child {
                for (index, element) in elements.iter().enumerate() {
                    unknowns.extend(find_unknown_keys(element, items, &format!("{path}[{index}]")));
                }
            }
        } else if !expected.fields.contains(key.as_str()) {
            unknowns.push(path);
        }
    }

    unknowns
}

/// Expected keys for a config section.
/// `fields` are leaf fields, `nested` are nested objects and `items` are
/// arrays of objects, each with their own expected keys.
struct ExpectedKeys {
    fields: HashSet<&'static str>,
    nested: HashMap<&'static str, ExpectedKeys>,
    items: HashMap<&'static str, ExpectedKeys>,
}

impl ExpectedKeys {
    fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.iter().copied().collect(),
            nested: HashMap::new(),
            items: HashMap::new(),
        }
    }

    fn with_nested(mut self, key: &'static str, nested: ExpectedKeys) -> Self {
        self.nested.insert(key, nested);
        self
    }

    fn with_items(mut self, key: &'static str, items: ExpectedKeys) -> Self {
        self.items.insert(key, items);
        self
    }
}

fn expected_action_keys() -> ExpectedKeys {
    ExpectedKeys::new(&[
        "action",
        "navigation_path",
        "url_path",
        "perform_action",
        "service",
        "data",
        "target",
    ])
}

fn expected_chip_keys() -> ExpectedKeys {
    ExpectedKeys::new(&[
        "entity",
        "primary",
        "secondary",
        "max_width",
        "icon",
        "icon_color",
        "icon_background",
        "badge_icon",
        "badge_color",
        "picture",
    ])
    .with_nested("tap_action", expected_action_keys())
    .with_nested("hold_action", expected_action_keys())
    .with_nested("double_tap_action", expected_action_keys())
}

fn expected_config_keys() -> ExpectedKeys {
    ExpectedKeys::new(&[])
        .with_nested("cache", ExpectedKeys::new(&["capacity"]))
        .with_nested(
            "backend",
            ExpectedKeys::new(&["socketPath", "requestTimeoutMs"]),
        )
        .with_nested("user", ExpectedKeys::new(&["id", "name", "is_admin"]))
        .with_items("chips", expected_chip_keys())
}
