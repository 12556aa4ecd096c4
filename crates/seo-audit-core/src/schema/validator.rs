use std::collections::HashSet;

use serde_json::{Map, Value};

use super::{
    AnalysisReport, ReportCategory, ReportItem, ReportItemStatus, SchemaError, Violation,
    REQUIRED_CATEGORIES,
};

/// Check `candidate` against the report contract, collecting every violation.
///
/// The top level must be an object holding all of [`REQUIRED_CATEGORIES`]. Additional
/// object-valued keys are validated as categories; any other extra key is passed through
/// verbatim. Unknown fields inside categories and items are ignored.
pub fn validate(candidate: &Value) -> Result<AnalysisReport, SchemaError> {
    let Some(object) = candidate.as_object() else {
        return Err(SchemaError::new(vec![Violation::new(
            "$",
            format!("expected an object, found {}", kind_of(candidate)),
        )]));
    };

    let mut violations = Vec::new();
    for key in REQUIRED_CATEGORIES {
        if !object.contains_key(key) {
            violations.push(Violation::new(key, "required category is missing"));
        }
    }

    let mut categories = Vec::with_capacity(object.len());
    let mut extras = Map::new();
    for (key, value) in object {
        if !REQUIRED_CATEGORIES.contains(&key.as_str()) && !value.is_object() {
            extras.insert(key.clone(), value.clone());
            continue;
        }
        if let Some(category) = validate_category(key, value, &mut violations) {
            categories.push((key.clone(), category));
        }
    }

    if violations.is_empty() {
        Ok(AnalysisReport::from_validated(categories, extras))
    } else {
        Err(SchemaError::new(violations))
    }
}

fn validate_category(
    path: &str,
    value: &Value,
    violations: &mut Vec<Violation>,
) -> Option<ReportCategory> {
    let Some(object) = value.as_object() else {
        violations.push(Violation::new(
            path,
            format!("expected a category object, found {}", kind_of(value)),
        ));
        return None;
    };

    let title = string_field(object, path, "title", false, violations);
    let score = score_field(object, path, violations);
    let items = items_field(object, path, violations);

    Some(ReportCategory {
        title: title?,
        score: score?,
        items: items?,
    })
}

fn score_field(
    object: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<u8> {
    let field_path = format!("{path}.score");
    match object.get("score") {
        None => {
            violations.push(Violation::new(field_path, "required field is missing"));
            None
        }
        Some(Value::Number(number)) => {
            if let Some(score) = number.as_i64() {
                match u8::try_from(score) {
                    Ok(score) if score <= 100 => Some(score),
                    _ => {
                        violations.push(Violation::new(
                            field_path,
                            format!("must be within 0..=100 (got {score})"),
                        ));
                        None
                    }
                }
            } else if number.is_u64() {
                violations.push(Violation::new(
                    field_path,
                    format!("must be within 0..=100 (got {number})"),
                ));
                None
            } else {
                violations.push(Violation::new(
                    field_path,
                    format!("expected an integer, found {number}"),
                ));
                None
            }
        }
        Some(other) => {
            violations.push(Violation::new(
                field_path,
                format!("expected an integer, found {}", kind_of(other)),
            ));
            None
        }
    }
}

fn items_field(
    object: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Vec<ReportItem>> {
    let field_path = format!("{path}.items");
    let entries = match object.get("items") {
        None => {
            violations.push(Violation::new(field_path, "required field is missing"));
            return None;
        }
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            violations.push(Violation::new(
                field_path,
                format!("expected an array, found {}", kind_of(other)),
            ));
            return None;
        }
    };

    let mut items = Vec::with_capacity(entries.len());
    let mut seen_ids = HashSet::new();
    let mut complete = true;
    for (idx, entry) in entries.iter().enumerate() {
        let item_path = format!("{field_path}[{idx}]");
        match validate_item(&item_path, entry, violations) {
            Some(item) => {
                if !seen_ids.insert(item.id.clone()) {
                    violations.push(Violation::new(
                        format!("{item_path}.id"),
                        format!("duplicate item id `{}` within category", item.id),
                    ));
                    complete = false;
                }
                items.push(item);
            }
            None => complete = false,
        }
    }

    complete.then_some(items)
}

fn validate_item(path: &str, value: &Value, violations: &mut Vec<Violation>) -> Option<ReportItem> {
    let Some(object) = value.as_object() else {
        violations.push(Violation::new(
            path,
            format!("expected an item object, found {}", kind_of(value)),
        ));
        return None;
    };

    let id = string_field(object, path, "id", true, violations);
    let name = string_field(object, path, "name", true, violations);
    let status = status_field(object, path, violations);
    let value = string_field(object, path, "value", true, violations);
    let description = string_field(object, path, "description", true, violations);
    let guidance = string_field(object, path, "guidance", true, violations);

    Some(ReportItem {
        id: id?,
        name: name?,
        status: status?,
        value: value?,
        description: description?,
        guidance: guidance?,
    })
}

fn status_field(
    object: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<ReportItemStatus> {
    let field_path = format!("{path}.status");
    match object.get("status") {
        None => {
            violations.push(Violation::new(field_path, "required field is missing"));
            None
        }
        Some(Value::String(raw)) => {
            let status = ReportItemStatus::parse(raw);
            if status.is_none() {
                violations.push(Violation::new(
                    field_path,
                    format!("must be one of pass, warn, fail (got {raw:?})"),
                ));
            }
            status
        }
        Some(other) => {
            violations.push(Violation::new(
                field_path,
                format!("expected a string, found {}", kind_of(other)),
            ));
            None
        }
    }
}

fn string_field(
    object: &Map<String, Value>,
    path: &str,
    field: &str,
    allow_empty: bool,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let field_path = format!("{path}.{field}");
    match object.get(field) {
        None => {
            violations.push(Violation::new(field_path, "required field is missing"));
            None
        }
        Some(Value::String(text)) if !allow_empty && text.is_empty() => {
            violations.push(Violation::new(field_path, "must not be empty"));
            None
        }
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            violations.push(Violation::new(
                field_path,
                format!("expected a string, found {}", kind_of(other)),
            ));
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
