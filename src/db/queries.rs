//! SQL for the extension registry.
//!
//! Every statement that carries a caller-supplied value binds it as a
//! positional parameter. Nothing here is ever assembled with `format!`.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial query constants

/// Table name for program/extension associations.
pub const TABLE: &str = "Programs";

/// Idempotent schema. Duplicate pairs are dropped by the constraint itself.
pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Programs(
    program_path TEXT,
    program_extension TEXT,
    UNIQUE(program_path, program_extension) ON CONFLICT IGNORE
)
"#;

/// Insert one association: ?1 = program_path, ?2 = program_extension.
pub const INSERT_ASSOCIATION: &str = r#"
INSERT INTO Programs (program_path, program_extension)
VALUES (?1, ?2)
"#;

/// Remove every association for a path: ?1 = program_path.
pub const DELETE_BY_PATH: &str = r#"
DELETE FROM Programs
WHERE program_path = ?1
"#;

/// Programs registered for an extension: ?1 = program_extension.
///
/// No ORDER BY; rows come back in store iteration order.
pub const SELECT_BY_EXTENSION: &str = r#"
SELECT program_path
FROM Programs
WHERE program_extension = ?1
"#;

/// Every association, in store iteration order.
pub const SELECT_ALL: &str = r#"
SELECT program_path, program_extension
FROM Programs
"#;

/// Number of stored associations.
pub const COUNT_ALL: &str = "SELECT COUNT(*) FROM Programs";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_statements_are_parameterized() {
        for sql in [INSERT_ASSOCIATION, DELETE_BY_PATH, SELECT_BY_EXTENSION] {
            assert!(sql.contains("?1"), "missing bound parameter in {}", sql);
            assert!(!sql.contains('\''), "literal quote in {}", sql);
        }
        assert!(INSERT_ASSOCIATION.contains("?2"));
    }

    #[test]
    fn test_schema_names_table() {
        assert!(CREATE_SCHEMA.contains(TABLE));
        assert!(CREATE_SCHEMA.contains("ON CONFLICT IGNORE"));
    }
}
