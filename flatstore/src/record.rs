// Record shape - a stored item is a flat mapping of column name to JSON value

/// A record within a collection: column name to value, plus the
/// implicit identifier column.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Reserved identifier column, present on every stored record.
pub const ID_COLUMN: &str = "id";
