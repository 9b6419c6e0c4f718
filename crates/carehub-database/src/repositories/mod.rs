//! Repository implementations for all CareHub entities.

pub mod audit;
pub mod client;
pub mod staff;

pub use audit::AuditRepository;
pub use client::ClientRepository;
pub use staff::StaffRepository;

use carehub_core::error::{AppError, ErrorKind};

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a sqlx error into an [`AppError`], surfacing constraint violations
/// as client errors instead of database faults.
pub(crate) fn db_error(context: &str, err: sqlx::Error) -> AppError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());

    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => {
            AppError::with_source(ErrorKind::Conflict, format!("{context}: already exists"), err)
        }
        Some(FOREIGN_KEY_VIOLATION) => AppError::with_source(
            ErrorKind::Conflict,
            format!("{context}: referenced record is missing or still in use"),
            err,
        ),
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), err),
    }
}

/// The value to write for a nullable patch field: `None` both when the field
/// is untouched and when it is being cleared. Pair with `field.is_some()`.
pub(crate) fn cleared_or_set(field: &Option<Option<String>>) -> Option<&str> {
    field.as_ref().and_then(|value| value.as_deref())
}

/// Build an `ILIKE` pattern matching `term` anywhere, with wildcards in the
/// term itself escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("acme"), "%acme%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_cleared_or_set() {
        assert_eq!(cleared_or_set(&None), None);
        assert_eq!(cleared_or_set(&Some(None)), None);
        assert_eq!(cleared_or_set(&Some(Some("HR".into()))), Some("HR"));
    }

    #[test]
    fn test_db_error_defaults_to_database_kind() {
        let err = db_error("Failed to find client", sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::Database);
        assert_eq!(err.message, "Failed to find client");
    }
}
