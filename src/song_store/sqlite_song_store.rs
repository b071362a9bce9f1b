use super::models::{non_blank, NewSong, Pagination, Song, SongFilter, SongId};
use super::schema::SONG_VERSIONED_SCHEMAS;
use super::{SongStore, SongStoreError, SongStoreResult};
use crate::sqlite_persistence::read_schema_version;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const SONG_COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, group_name, title, release_date, text, link";

#[derive(Clone)]
pub struct SqliteSongStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSongStore {
    /// Opens the song database at `db_path`, creating it with the latest schema
    /// if it does not exist yet.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open song database")?;
        Self::register_functions(&conn)?;

        if is_new_db {
            info!("Creating new song database at {:?}", path);
            Self::create_latest_schema(&conn)?;
        } else {
            let db_version = read_schema_version(&conn)?
                .with_context(|| format!("{:?} is not a song database", path))?;
            let current_schema_version = Self::latest_schema_version();

            let version_index = SONG_VERSIONED_SCHEMAS
                .iter()
                .position(|s| s.version == db_version)
                .with_context(|| format!("Unknown song database version {}", db_version))?;
            SONG_VERSIONED_SCHEMAS[version_index]
                .validate(&conn)
                .with_context(|| {
                    format!(
                        "Song database schema validation failed for version {}",
                        db_version
                    )
                })?;

            if db_version < current_schema_version {
                info!(
                    "Migrating song database from version {} to {}",
                    db_version, current_schema_version
                );
                Self::migrate(&mut conn, db_version)?;
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, contents are lost when dropped.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::register_functions(&conn)?;
        Self::create_latest_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn latest_schema_version() -> usize {
        SONG_VERSIONED_SCHEMAS
            .last()
            .map(|schema| schema.version)
            .unwrap_or(0)
    }

    /// SQLite's `lower()` only folds ASCII, filters go through `unicode_lower` instead.
    fn register_functions(conn: &Connection) -> Result<()> {
        conn.create_scalar_function(
            "unicode_lower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let value: Option<String> = ctx.get(0)?;
                Ok(value.map(|v| v.to_lowercase()))
            },
        )
        .context("Failed to register unicode_lower")
    }

    fn create_latest_schema(conn: &Connection) -> Result<()> {
        let schema = SONG_VERSIONED_SCHEMAS
            .last()
            .context("No song schema defined")?;
        schema.create(conn)
    }

    fn migrate(conn: &mut Connection, from_version: usize) -> Result<()> {
        let tx = conn.transaction()?;
        let mut latest_from = from_version;
        for schema in SONG_VERSIONED_SCHEMAS
            .iter()
            .filter(|s| s.version > from_version)
        {
            if let Some(migration_fn) = schema.migration {
                migration_fn(&tx).with_context(|| {
                    format!("Failed to run migration to version {}", schema.version)
                })?;
            }
            latest_from = schema.version;
        }
        tx.execute(
            &format!(
                "PRAGMA user_version = {}",
                crate::sqlite_persistence::BASE_DB_VERSION + latest_from
            ),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn conn(&self) -> SongStoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SongStoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339()
    }

    fn parse_datetime(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    column,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }

    fn row_to_song(row: &rusqlite::Row) -> rusqlite::Result<Song> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let deleted_at: Option<String> = row.get("deleted_at")?;

        Ok(Song {
            id: row.get("id")?,
            created_at: Self::parse_datetime(&created_at, 1)?,
            updated_at: Self::parse_datetime(&updated_at, 2)?,
            deleted_at: deleted_at
                .map(|s| Self::parse_datetime(&s, 3))
                .transpose()?,
            group: row.get("group_name")?,
            title: row.get("title")?,
            release_date: row.get("release_date")?,
            text: row.get("text")?,
            link: row.get("link")?,
        })
    }

    fn find_where(conn: &Connection, id: SongId, active_only: bool) -> SongStoreResult<Song> {
        let sql = if active_only {
            format!(
                "SELECT {} FROM songs WHERE id = ?1 AND deleted_at IS NULL",
                SONG_COLUMNS
            )
        } else {
            format!("SELECT {} FROM songs WHERE id = ?1", SONG_COLUMNS)
        };
        conn.query_row(&sql, params![id], Self::row_to_song)
            .optional()?
            .ok_or(SongStoreError::NotFound(id))
    }
}

impl SongStore for SqliteSongStore {
    fn create(&self, song: NewSong) -> SongStoreResult<Song> {
        let conn = self.conn()?;
        let now = Utc::now();
        let now_str = Self::format_datetime(&now);

        conn.execute(
            "INSERT INTO songs (created_at, updated_at, group_name, title, release_date, text, link)
             VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                now_str,
                song.group,
                song.title,
                song.release_date,
                song.text,
                song.link
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted song {} ({} - {})", id, song.group, song.title);

        Ok(Song {
            id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            group: song.group,
            title: song.title,
            release_date: song.release_date,
            text: song.text,
            link: song.link,
        })
    }

    fn find_active(&self, id: SongId) -> SongStoreResult<Song> {
        let conn = self.conn()?;
        Self::find_where(&conn, id, true)
    }

    fn find_any(&self, id: SongId) -> SongStoreResult<Song> {
        let conn = self.conn()?;
        Self::find_where(&conn, id, false)
    }

    fn find_by_group_and_title(&self, group: &str, title: &str) -> SongStoreResult<Option<Song>> {
        let conn = self.conn()?;
        let song = conn
            .query_row(
                &format!(
                    "SELECT {} FROM songs
                     WHERE group_name = ?1 AND title = ?2 AND deleted_at IS NULL
                     ORDER BY id ASC LIMIT 1",
                    SONG_COLUMNS
                ),
                params![group, title],
                Self::row_to_song,
            )
            .optional()?;
        Ok(song)
    }

    fn list(&self, filter: &SongFilter, pagination: Pagination) -> SongStoreResult<Vec<Song>> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut values: Vec<Value> = Vec::new();

        let substring_filters = [
            ("group_name", non_blank(&filter.group)),
            ("title", non_blank(&filter.title)),
            ("text", non_blank(&filter.text)),
            ("link", non_blank(&filter.link)),
        ];
        for (column, needle) in substring_filters {
            if let Some(needle) = needle {
                values.push(Value::Text(needle.to_lowercase()));
                conditions.push(format!(
                    "instr(unicode_lower({}), ?{}) > 0",
                    column,
                    values.len()
                ));
            }
        }
        if let Some(release_date) = non_blank(&filter.release_date) {
            values.push(Value::Text(release_date.to_string()));
            conditions.push(format!("release_date = ?{}", values.len()));
        }

        values.push(Value::Integer(
            i64::try_from(pagination.limit).unwrap_or(i64::MAX),
        ));
        let limit_index = values.len();
        values.push(Value::Integer(
            i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
        ));
        let offset_index = values.len();

        let sql = format!(
            "SELECT {} FROM songs WHERE {} ORDER BY id ASC LIMIT ?{} OFFSET ?{}",
            SONG_COLUMNS,
            conditions.join(" AND "),
            limit_index,
            offset_index
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let songs = stmt
            .query_map(params_from_iter(values), Self::row_to_song)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn update(&self, song: &Song) -> SongStoreResult<Song> {
        let conn = self.conn()?;
        let now_str = Self::format_datetime(&Utc::now());

        let changed = conn.execute(
            "UPDATE songs
             SET group_name = ?1, title = ?2, release_date = ?3, text = ?4, link = ?5, updated_at = ?6
             WHERE id = ?7 AND deleted_at IS NULL",
            params![
                song.group,
                song.title,
                song.release_date,
                song.text,
                song.link,
                now_str,
                song.id
            ],
        )?;
        if changed == 0 {
            return Err(SongStoreError::NotFound(song.id));
        }
        Self::find_where(&conn, song.id, true)
    }

    fn soft_delete(&self, id: SongId) -> SongStoreResult<()> {
        let conn = self.conn()?;
        let now_str = Self::format_datetime(&Utc::now());

        let changed = conn.execute(
            "UPDATE songs SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![now_str, id],
        )?;
        if changed == 0 {
            return Err(SongStoreError::NotFound(id));
        }
        Ok(())
    }

    fn count_active(&self) -> SongStoreResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM songs WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
