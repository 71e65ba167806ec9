//! Media repository: the SQLite-backed [`RecordStore`].
//!
//! Field names are checked against a fixed column table before any SQL is
//! built, so unknown names fail loudly instead of being ignored.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter};

use crate::media::{field, Category, Fields, RecordId, Value};
use crate::storage::{NewMedia, RecordFilter, RecordStore, ShotPeer};

use super::{sequence, Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
    Timestamp,
    Duration,
    File,
    Json,
    Categories,
}

const COLUMNS: &[(&str, ColumnKind)] = &[
    (field::UPLOADER_ID, ColumnKind::Int),
    (field::SESSION_ID, ColumnKind::Text),
    (field::MEDIA_TYPE, ColumnKind::Int),
    (field::SHOT_AT, ColumnKind::Timestamp),
    (field::SHOW_AT, ColumnKind::Timestamp),
    (field::WIDTH, ColumnKind::Int),
    (field::HEIGHT, ColumnKind::Int),
    (field::DURATION, ColumnKind::Duration),
    (field::CONTENT, ColumnKind::File),
    (field::SIZE_BYTES, ColumnKind::Int),
    (field::NEEDED_ROTATE_DEGREE, ColumnKind::Int),
    (field::CATEGORIES, ColumnKind::Categories),
    (field::PROCESSING_STATE_CODE, ColumnKind::Int),
    (field::MIMETYPE, ColumnKind::Text),
    (field::SOURCE_FILENAME, ColumnKind::Text),
    (field::SOURCE_LASTMODIFIED, ColumnKind::Timestamp),
    (field::SHA1_HEX, ColumnKind::Text),
    (field::SCREENSHOT, ColumnKind::File),
    (field::THUMBNAIL, ColumnKind::File),
    (field::THUMBNAIL_WIDTH, ColumnKind::Int),
    (field::THUMBNAIL_HEIGHT, ColumnKind::Int),
    (field::METADATA, ColumnKind::Json),
    (field::SHOT_ID, ColumnKind::Int),
    (field::CAMERA, ColumnKind::Text),
    (field::GPS_LATITUDE, ColumnKind::Float),
    (field::GPS_LONGITUDE, ColumnKind::Float),
    (field::GPS_ALTITUDE_M, ColumnKind::Float),
];

fn column(name: &str) -> Result<(&'static str, ColumnKind), DatabaseError> {
    COLUMNS
        .iter()
        .find(|(column, _)| *column == name)
        .copied()
        .ok_or_else(|| DatabaseError::UnknownField(name.to_string()))
}

fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn invalid(field: &str, reason: impl Into<String>) -> DatabaseError {
    DatabaseError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn to_sql(name: &str, kind: ColumnKind, value: &Value) -> Result<SqlValue, DatabaseError> {
    let converted = match (kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (ColumnKind::Int, Value::Int(i)) => SqlValue::Integer(*i),
        (ColumnKind::Float, Value::Float(f)) => SqlValue::Real(*f),
        (ColumnKind::Float, Value::Int(i)) => SqlValue::Real(*i as f64),
        (ColumnKind::Text, Value::Text(s)) => SqlValue::Text(s.clone()),
        (ColumnKind::Timestamp, Value::Timestamp(ts)) => SqlValue::Text(format_timestamp(ts)),
        (ColumnKind::Duration, Value::Duration(d)) => SqlValue::Integer(
            d.num_microseconds()
                .ok_or_else(|| invalid(name, "duration out of range"))?,
        ),
        (ColumnKind::File, Value::File(p)) => SqlValue::Text(
            p.to_str()
                .ok_or_else(|| invalid(name, "path is not valid UTF-8"))?
                .to_string(),
        ),
        (ColumnKind::Json, Value::Json(v)) => SqlValue::Text(v.to_string()),
        (ColumnKind::Categories, Value::Categories(set)) => {
            let codes: Vec<i64> = set.iter().map(|c| c.code()).collect();
            SqlValue::Text(serde_json::Value::from(codes).to_string())
        }
        (kind, other) => {
            return Err(invalid(
                name,
                format!("cannot store {} in a {:?} column", other.kind(), kind),
            ))
        }
    };
    Ok(converted)
}

fn from_sql(name: &str, kind: ColumnKind, value: SqlValue) -> Result<Value, DatabaseError> {
    let converted = match (kind, value) {
        (_, SqlValue::Null) => Value::Null,
        (ColumnKind::Int, SqlValue::Integer(i)) => Value::Int(i),
        (ColumnKind::Float, SqlValue::Real(f)) => Value::Float(f),
        (ColumnKind::Float, SqlValue::Integer(i)) => Value::Float(i as f64),
        (ColumnKind::Text, SqlValue::Text(s)) => Value::Text(s),
        (ColumnKind::Timestamp, SqlValue::Text(s)) => Value::Timestamp(
            DateTime::parse_from_rfc3339(&s).map_err(|e| invalid(name, e.to_string()))?,
        ),
        (ColumnKind::Duration, SqlValue::Integer(us)) => {
            Value::Duration(TimeDelta::microseconds(us))
        }
        (ColumnKind::File, SqlValue::Text(s)) => Value::File(PathBuf::from(s)),
        (ColumnKind::Json, SqlValue::Text(s)) => {
            Value::Json(serde_json::from_str(&s).map_err(|e| invalid(name, e.to_string()))?)
        }
        (ColumnKind::Categories, SqlValue::Text(s)) => {
            let codes: Vec<i64> =
                serde_json::from_str(&s).map_err(|e| invalid(name, e.to_string()))?;
            let categories = codes
                .into_iter()
                .map(|code| {
                    Category::from_code(code)
                        .ok_or_else(|| invalid(name, format!("unknown category code {}", code)))
                })
                .collect::<Result<BTreeSet<_>, _>>()?;
            Value::Categories(categories)
        }
        (kind, other) => {
            return Err(invalid(
                name,
                format!("unexpected {:?} for a {:?} column", other.data_type(), kind),
            ))
        }
    };
    Ok(converted)
}

#[derive(Clone)]
pub struct MediaRepository {
    db: Database,
}

impl MediaRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl RecordStore for MediaRepository {
    fn fetch(&self, id: RecordId, fields: &BTreeSet<String>) -> Result<Fields, DatabaseError> {
        let columns = fields
            .iter()
            .map(|name| column(name))
            .collect::<Result<Vec<_>, _>>()?;

        let select = if columns.is_empty() {
            "id".to_string()
        } else {
            columns
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let sql = format!("SELECT {} FROM media WHERE id = ?1", select);

        let raw: Option<Vec<SqlValue>> = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => {
                    let values = (0..columns.len())
                        .map(|idx| row.get::<_, SqlValue>(idx))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Some(values))
                }
                None => Ok(None),
            }
        })?;

        let raw = raw.ok_or(DatabaseError::NotFound(id))?;
        columns
            .into_iter()
            .zip(raw)
            .map(|((name, kind), value)| Ok((name.to_string(), from_sql(name, kind, value)?)))
            .collect()
    }

    fn persist(&self, id: RecordId, changed: &Fields) -> Result<(), DatabaseError> {
        if changed.is_empty() {
            return Ok(());
        }

        let mut assignments = Vec::with_capacity(changed.len() + 2);
        let mut values = Vec::with_capacity(changed.len() + 3);
        for (name, value) in changed {
            let (column, kind) = column(name)?;
            values.push(to_sql(name, kind, value)?);
            assignments.push(format!("{} = ?{}", column, values.len()));

            if column == field::SHOT_AT {
                values.push(match value.as_timestamp() {
                    Some(ts) => SqlValue::Integer(ts.timestamp_micros()),
                    None => SqlValue::Null,
                });
                assignments.push(format!("shot_at_us = ?{}", values.len()));
            }
        }
        values.push(SqlValue::Text(Utc::now().to_rfc3339()));
        assignments.push(format!("updated_at = ?{}", values.len()));
        values.push(SqlValue::Integer(id));
        let sql = format!(
            "UPDATE media SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len()
        );

        let updated = self
            .db
            .with_conn(|conn| Ok(conn.execute(&sql, params_from_iter(values.iter()))?))?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    }

    fn ids(&self, filter: RecordFilter) -> Result<Vec<RecordId>, DatabaseError> {
        let sql = match filter {
            RecordFilter::All => "SELECT id FROM media ORDER BY id",
            RecordFilter::Failed => {
                "SELECT id FROM media WHERE processing_state_code < 0 ORDER BY id"
            }
        };
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let ids = stmt
                .query_map([], |r| r.get(0))?
                .collect::<Result<Vec<RecordId>, _>>()?;
            Ok(ids)
        })
    }

    fn create(&self, media: &NewMedia) -> Result<RecordId, DatabaseError> {
        let content = media
            .content
            .to_str()
            .ok_or_else(|| invalid(field::CONTENT, "path is not valid UTF-8"))?
            .to_string();
        let lastmodified = media.source_lastmodified.as_ref().map(format_timestamp);
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO media (uploader_id, session_id, content, size_bytes, sha1_hex,
                 mimetype, source_filename, source_lastmodified, processing_state_code,
                 metadata, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, '{}', ?9, ?9)",
                params![
                    media.uploader_id,
                    media.session_id.to_string(),
                    content,
                    media.size_bytes,
                    media.sha1_hex,
                    media.mimetype,
                    media.source_filename,
                    lastmodified,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn find_duplicate(
        &self,
        uploader_id: i64,
        sha1_hex: &str,
        size_bytes: i64,
    ) -> Result<Option<RecordId>, DatabaseError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM media WHERE uploader_id = ?1 AND sha1_hex = ?2 AND size_bytes = ?3",
            )?;
            let mut rows = stmt.query_map(params![uploader_id, sha1_hex, size_bytes], |r| r.get(0))?;
            match rows.next() {
                Some(Ok(id)) => Ok(Some(id)),
                Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
                None => Ok(None),
            }
        })
    }

    fn find_by_shot_at(&self, shot_at: &DateTime<FixedOffset>) -> Result<Vec<ShotPeer>, DatabaseError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, shot_id FROM media WHERE shot_at_us = ?1 ORDER BY id")?;
            let peers = stmt
                .query_map(params![shot_at.timestamp_micros()], |r| {
                    Ok(ShotPeer {
                        id: r.get(0)?,
                        shot_id: r.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(peers)
        })
    }

    fn assign_shot(&self, ids: &[RecordId], shot_id: i64) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt =
                    tx.prepare("UPDATE media SET shot_id = ?1, updated_at = ?2 WHERE id = ?3")?;
                for id in ids {
                    stmt.execute(params![shot_id, now, id])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn next_sequence_value(&self, name: &str) -> Result<i64, DatabaseError> {
        sequence::next_value(&self.db, name)
    }
}
