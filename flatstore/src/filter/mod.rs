//! Predicate filtering: select the subsequence of records matching a
//! where-condition.
//!
//! A condition maps a column name to either a literal value (deep
//! equality) or an operator-keyed sub-condition such as `{"$gt": 21}`.
//! Multiple columns combine with logical AND. An absent or empty
//! condition matches every record.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A where-condition: column name to expected literal or operator map.
pub type Condition = serde_json::Map<String, Value>;

/// Caller-supplied criteria narrowing select/update/delete to matching
/// records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#where: Option<Condition>,
}

impl QueryOption {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(condition: Condition) -> Self {
        Self {
            r#where: Some(condition),
        }
    }

    /// Match the single record with the given id.
    pub fn by_id(id: &str) -> Self {
        let mut condition = Condition::new();
        condition.insert(
            crate::record::ID_COLUMN.to_string(),
            Value::String(id.to_string()),
        );
        Self::filtered(condition)
    }
}

/// Keep the records satisfying the condition, in their original order.
pub fn filter(records: Vec<Record>, condition: Option<&Condition>) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| matches(record, condition))
        .collect()
}

/// Test a single record. Equivalent to filtering a singleton sequence:
/// update and delete rely on this to probe records one at a time.
pub fn matches(record: &Record, condition: Option<&Condition>) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    condition.iter().all(|(column, expected)| {
        // A constraint only matches records that carry the column.
        let Some(actual) = record.get(column) else {
            return false;
        };

        match operator_map(expected) {
            Some(operators) => operators
                .iter()
                .all(|(op, operand)| apply_operator(op, actual, operand)),
            None => actual == expected,
        }
    })
}

/// An object whose keys all start with `$` is an operator
/// sub-condition rather than a literal.
fn operator_map(expected: &Value) -> Option<&Condition> {
    match expected {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => {
            Some(map)
        }
        _ => None,
    }
}

fn apply_operator(op: &str, actual: &Value, operand: &Value) -> bool {
    match op {
        "$eq" => actual == operand,
        "$ne" => actual != operand,
        "$gt" => compare(actual, operand) == Some(Ordering::Greater),
        "$gte" => matches!(
            compare(actual, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$lt" => compare(actual, operand) == Some(Ordering::Less),
        "$lte" => matches!(
            compare(actual, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "$in" => operand
            .as_array()
            .is_some_and(|values| values.contains(actual)),
        // Unknown operators never match
        _ => false,
    }
}

/// Ordering is defined for number pairs and string pairs only.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
