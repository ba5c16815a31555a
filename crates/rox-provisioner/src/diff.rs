use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

/// One top-level field whose observed value differs from the desired one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDrift {
    /// Wire name of the field, e.g. "collectorImage"
    pub field: String,
    /// What the record asks for
    pub expected: Value,
    /// What Central has
    pub actual: Value,
}

/// Every drifted field of one resource, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Drift {
    pub fields: Vec<FieldDrift>,
}

impl Drift {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as a short multi-line report headed by `title`.
    pub fn render(&self, title: &str) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = format!("Observed difference in {title}");
        for drift in &self.fields {
            let _ = write!(
                out,
                "\n  {}: expected {}, actual {}",
                drift.field, drift.expected, drift.actual
            );
        }
        out
    }
}

/// Compare two projections of the same shape field by field.
///
/// Both sides are serialized and their top-level keys compared. A missing
/// key, `null`, `[]` and `{}` are all treated as the same empty value.
pub fn diff_fields<T: Serialize>(desired: &T, observed: &T) -> Drift {
    let desired = to_object(desired);
    let observed = to_object(observed);

    let mut keys: Vec<&String> = desired.keys().chain(observed.keys()).collect();
    keys.sort();
    keys.dedup();

    let fields = keys
        .into_iter()
        .filter_map(|key| {
            let expected = desired.get(key).cloned().unwrap_or(Value::Null);
            let actual = observed.get(key).cloned().unwrap_or(Value::Null);
            (!equivalent(&expected, &actual)).then(|| FieldDrift {
                field: key.clone(),
                expected,
                actual,
            })
        })
        .collect();

    Drift { fields }
}

fn to_object<T: Serialize>(value: &T) -> serde_json::Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn equivalent(a: &Value, b: &Value) -> bool {
    if is_empty(a) && is_empty(b) {
        return true;
    }
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equivalent(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.keys().chain(ys.keys()).all(|key| {
                equivalent(
                    xs.get(key).unwrap_or(&Value::Null),
                    ys.get(key).unwrap_or(&Value::Null),
                )
            })
        }
        _ => a == b,
    }
}
