//! Named monotonically increasing counters.

use rusqlite::params;

use super::{Database, DatabaseError};

/// Returns the next value of `name`, starting at 1.
pub fn next_value(db: &Database, name: &str) -> Result<i64, DatabaseError> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(DatabaseError::InvalidSequence(name.to_string()));
    }

    db.with_conn(|conn| {
        let value = conn.query_row(
            "INSERT INTO sequences (name, value) VALUES (?1, 1)
             ON CONFLICT(name) DO UPDATE SET value = value + 1
             RETURNING value",
            params![name],
            |r| r.get(0),
        )?;
        Ok(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_one_and_increments() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(next_value(&db, "media_shot").unwrap(), 1);
        assert_eq!(next_value(&db, "media_shot").unwrap(), 2);
        assert_eq!(next_value(&db, "other").unwrap(), 1);
        assert_eq!(next_value(&db, "media_shot").unwrap(), 3);
    }

    #[test]
    fn test_invalid_sequence_name() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            next_value(&db, "Robert'); DROP TABLE media;--"),
            Err(DatabaseError::InvalidSequence(_))
        ));
        assert!(next_value(&db, "").is_err());
    }
}
