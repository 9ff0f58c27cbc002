/// Catalog identifiers are opaque server-assigned strings (the `_id` field).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
