use super::StatementFailure;

/// SQLSTATE codes PostgreSQL uses when the object a DDL statement creates is
/// already there.
pub const DUPLICATE_OBJECT_CODES: [&str; 9] = [
    "42P07", // duplicate_table
    "42710", // duplicate_object
    "42P06", // duplicate_schema
    "42723", // duplicate_function
    "42P04", // duplicate_database
    "42701", // duplicate_column
    "42P05", // duplicate_prepared_statement
    "42P03", // duplicate_cursor
    "42712", // duplicate_alias
];

const ALREADY_EXISTS: &str = "already exists";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementErrorKind {
    /// The statement's target is already present; re-running is a no-op.
    AlreadyExists,
    Other,
}

/// The SQLSTATE decides when the database sent one. The message match is a
/// best-effort fallback for errors that arrive without a known code.
pub fn classify(failure: &StatementFailure) -> StatementErrorKind {
    if let Some(code) = failure.code.as_deref() {
        if DUPLICATE_OBJECT_CODES.contains(&code) {
            return StatementErrorKind::AlreadyExists;
        }
    }

    if failure.message.to_lowercase().contains(ALREADY_EXISTS) {
        StatementErrorKind::AlreadyExists
    } else {
        StatementErrorKind::Other
    }
}
