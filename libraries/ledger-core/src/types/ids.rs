/// ID types for ledger entities
///
/// Identifiers are assigned by the local store (SQLite rowids) and are never
/// reassigned once a record has been inserted.

/// Work order / expense identifier
pub type RecordId = i64;

/// Local user row identifier
pub type UserId = i64;
