//! SQLite Resource Repository
//!
//! Implements ResourceRepository on a single SQLite database. The composite
//! primary key enforces uniqueness; blocking calls run on the blocking
//! thread pool.

use crate::domain::entities::{ConfigDocument, ResourceRecord};
use crate::domain::error::StoreError;
use crate::domain::ports::ResourceRepository;
use crate::domain::value_objects::{ResourceKey, ResourceKind, ResourceType};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::sync::Arc;

/// SQL schema for the resources table.
pub const RESOURCES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS resources (
    name TEXT NOT NULL,
    provider TEXT NOT NULL DEFAULT 'http',
    protocol TEXT NOT NULL,
    type TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    config TEXT NOT NULL,
    PRIMARY KEY (name, provider, protocol, type)
);

CREATE INDEX IF NOT EXISTS idx_resources_kind ON resources(protocol, type, enabled);
"#;

const SELECT_COLUMNS: &str = "SELECT name, provider, protocol, type, enabled, config FROM resources";

/// SQLite-backed authoritative store.
pub struct SqliteResourceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteResourceRepository {
    /// Open (or create) the database file and apply the schema.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path).map_err(backend)?;
        Self::with_connection(conn)
    }

    /// Private database that lives as long as the repository.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(RESOURCES_SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("spawn_blocking error: {}", e)))?
    }

    fn query_records<P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> Result<Vec<ResourceRecord>, StoreError> {
        let mut stmt = conn.prepare(sql).map_err(backend)?;
        let rows = stmt
            .query_map(params, |row| Self::read_row(row))
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        rows.into_iter().map(Self::row_to_record).collect()
    }

    fn read_row(row: &Row) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            name: row.get(0)?,
            provider: row.get(1)?,
            protocol: row.get(2)?,
            resource_type: row.get(3)?,
            enabled: row.get(4)?,
            config: row.get(5)?,
        })
    }

    /// Convert a stored row to a record, rejecting rows this build cannot
    /// interpret.
    fn row_to_record(row: RawRow) -> Result<ResourceRecord, StoreError> {
        let kind = ResourceKind::parse(&row.protocol, &row.resource_type).map_err(|_| {
            StoreError::Backend(format!(
                "stored resource {} has unsupported kind {}/{}",
                row.name, row.protocol, row.resource_type
            ))
        })?;
        let config: ConfigDocument = serde_json::from_str(&row.config).map_err(|e| {
            StoreError::Backend(format!("stored config of {} is not a JSON object: {}", row.name, e))
        })?;
        Ok(ResourceRecord {
            name: row.name,
            provider: row.provider,
            kind,
            enabled: row.enabled,
            config,
        })
    }
}

struct RawRow {
    name: String,
    provider: String,
    protocol: String,
    resource_type: String,
    enabled: bool,
    config: String,
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn encode_config(record: &ResourceRecord) -> Result<String, StoreError> {
    serde_json::to_string(&record.config).map_err(|e| StoreError::Backend(e.to_string()))
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

#[async_trait]
impl ResourceRepository for SqliteResourceRepository {
    async fn create(&self, record: &ResourceRecord) -> Result<(), StoreError> {
        let record = record.clone();
        let config = encode_config(&record)?;
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO resources (name, provider, protocol, type, enabled, config)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.name,
                    record.provider,
                    record.kind.protocol().as_str(),
                    record.kind.resource_type().as_str(),
                    record.enabled,
                    config
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict(record.key().to_string())
                } else {
                    backend(e)
                }
            })?;
            Ok(())
        })
        .await
    }

    async fn find_by_key(&self, key: &ResourceKey) -> Result<Option<ResourceRecord>, StoreError> {
        let key = key.clone();
        self.run(move |conn| {
            let sql = format!(
                "{} WHERE name = ?1 AND provider = ?2 AND protocol = ?3 AND type = ?4",
                SELECT_COLUMNS
            );
            let mut found = Self::query_records(
                conn,
                &sql,
                params![
                    key.name,
                    key.provider,
                    key.kind.protocol().as_str(),
                    key.kind.resource_type().as_str()
                ],
            )?;
            Ok(found.pop())
        })
        .await
    }

    async fn find_by_kind(
        &self,
        kind: ResourceKind,
        enabled_only: bool,
    ) -> Result<Vec<ResourceRecord>, StoreError> {
        self.run(move |conn| {
            let sql = format!(
                "{} WHERE protocol = ?1 AND type = ?2 AND (enabled = 1 OR ?3 = 0)",
                SELECT_COLUMNS
            );
            Self::query_records(
                conn,
                &sql,
                params![
                    kind.protocol().as_str(),
                    kind.resource_type().as_str(),
                    enabled_only
                ],
            )
        })
        .await
    }

    async fn find_all_enabled(&self) -> Result<Vec<ResourceRecord>, StoreError> {
        self.run(|conn| {
            let sql = format!("{} WHERE enabled = 1", SELECT_COLUMNS);
            Self::query_records(conn, &sql, [])
        })
        .await
    }

    async fn find_servers_transports(&self) -> Result<Vec<ResourceRecord>, StoreError> {
        self.run(|conn| {
            let sql = format!("{} WHERE type = ?1 AND enabled = 1", SELECT_COLUMNS);
            Self::query_records(conn, &sql, params![ResourceType::ServersTransport.as_str()])
        })
        .await
    }

    async fn update(&self, record: &ResourceRecord) -> Result<(), StoreError> {
        let record = record.clone();
        let config = encode_config(&record)?;
        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE resources SET enabled = ?1, config = ?2
                     WHERE name = ?3 AND provider = ?4 AND protocol = ?5 AND type = ?6",
                    params![
                        record.enabled,
                        config,
                        record.name,
                        record.provider,
                        record.kind.protocol().as_str(),
                        record.kind.resource_type().as_str()
                    ],
                )
                .map_err(backend)?;
            if changed == 0 {
                return Err(StoreError::NotFound(record.key().to_string()));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &ResourceKey) -> Result<u64, StoreError> {
        let key = key.clone();
        self.run(move |conn| {
            let removed = conn
                .execute(
                    "DELETE FROM resources
                     WHERE name = ?1 AND provider = ?2 AND protocol = ?3 AND type = ?4",
                    params![
                        key.name,
                        key.provider,
                        key.kind.protocol().as_str(),
                        key.kind.resource_type().as_str()
                    ],
                )
                .map_err(backend)?;
            Ok(removed as u64)
        })
        .await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.run(|conn| {
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))
                .map_err(backend)?;
            Ok(n as u64)
        })
        .await
    }
}
