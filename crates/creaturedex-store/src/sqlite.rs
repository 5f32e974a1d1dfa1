//! SQLite-backed catalog
//!
//! Uniqueness of `name` and `scientific_name` is enforced by the schema, so
//! two writers racing on the same creature cannot both succeed. Blocking
//! database work runs on `spawn_blocking`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use creaturedex_model::{BodyShape, Creature, CreatureUpdate, NewCreature};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{ErrorCode, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::{CreatureStore, StoreError};

type DbPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS creatures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    scientific_name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    type TEXT NOT NULL,
    gender_ratio REAL NOT NULL,
    kingdom TEXT NOT NULL,
    classification TEXT NOT NULL,
    family TEXT NOT NULL,
    height_cm REAL NOT NULL,
    weight_kg REAL NOT NULL,
    body_shape TEXT NOT NULL,
    image_path TEXT NOT NULL
)";

const COLUMNS: &str = "id, name, scientific_name, description, type, gender_ratio, kingdom, \
                       classification, family, height_cm, weight_kg, body_shape, image_path";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<DbPool>,
}

impl SqliteStore {
    /// Open (or create) the catalog database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the database cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| backend("Failed to open database", e))?;

        let store = Self {
            pool: Arc::new(pool),
        };
        store.init_schema()?;
        info!(path = %path.display(), "Opened creature catalog");
        Ok(store)
    }

    /// Private in-memory database, for tests and one-off runs.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the schema cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        // A single connection: every in-memory connection is its own database
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .map_err(|e| backend("Failed to open in-memory database", e))?;

        let store = Self {
            pool: Arc::new(pool),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = connection(&self.pool)?;
        conn.execute(SCHEMA, [])
            .map_err(|e| backend("Failed to create creatures table", e))?;
        Ok(())
    }

    /// Run `op` with a pooled connection on the blocking thread pool
    async fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let conn = connection(&pool)?;
            op(&conn)
        })
        .await
        .map_err(|e| backend("Task join error", e))?
    }
}

fn backend(context: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("{context}: {err}"))
}

fn connection(pool: &DbPool) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
    pool.get()
        .map_err(|e| backend("Failed to get connection", e))
}

/// Translate a write failure, naming the unique field that was violated.
fn map_write_error(err: rusqlite::Error, name: &str, scientific_name: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err
        && failure.code == ErrorCode::ConstraintViolation
    {
        let message = message.as_deref().unwrap_or_default();
        if message.contains("creatures.scientific_name") {
            return StoreError::Conflict {
                field: "scientific_name".to_string(),
                value: scientific_name.to_string(),
            };
        }
        if message.contains("creatures.name") {
            return StoreError::Conflict {
                field: "name".to_string(),
                value: name.to_string(),
            };
        }
    }
    backend("Failed to write creature", err)
}

fn row_to_creature(row: &Row<'_>) -> rusqlite::Result<Creature> {
    let body_shape: String = row.get(11)?;
    let body_shape = body_shape.parse::<BodyShape>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Creature {
        id: row.get(0)?,
        name: row.get(1)?,
        scientific_name: row.get(2)?,
        description: row.get(3)?,
        creature_type: row.get(4)?,
        gender_ratio: row.get(5)?,
        kingdom: row.get(6)?,
        classification: row.get(7)?,
        family: row.get(8)?,
        height_cm: row.get(9)?,
        weight_kg: row.get(10)?,
        body_shape,
        image_path: row.get(12)?,
    })
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> Result<Option<Creature>, StoreError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM creatures WHERE id = ?1"),
        params![id],
        row_to_creature,
    )
    .optional()
    .map_err(|e| backend("Failed to load creature", e))
}

#[async_trait]
impl CreatureStore for SqliteStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Creature>, StoreError> {
        let name = name.to_string();
        self.with_connection(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM creatures WHERE name = ?1"),
                params![name],
                row_to_creature,
            )
            .optional()
            .map_err(|e| backend("Failed to look up creature", e))
        })
        .await
    }

    async fn create(&self, creature: NewCreature) -> Result<Creature, StoreError> {
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO creatures (name, scientific_name, description, type, gender_ratio, \
                 kingdom, classification, family, height_cm, weight_kg, body_shape, image_path) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    creature.name,
                    creature.scientific_name,
                    creature.description,
                    creature.creature_type,
                    creature.gender_ratio,
                    creature.kingdom,
                    creature.classification,
                    creature.family,
                    creature.height_cm,
                    creature.weight_kg,
                    creature.body_shape.as_str(),
                    creature.image_path,
                ],
            )
            .map_err(|e| map_write_error(e, &creature.name, &creature.scientific_name))?;

            let id = conn.last_insert_rowid();
            debug!(id, name = %creature.name, "Inserted creature");
            Ok(creature.with_id(id))
        })
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<Creature>, StoreError> {
        self.with_connection(move |conn| select_by_id(conn, id)).await
    }

    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Creature>, StoreError> {
        self.with_connection(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {COLUMNS} FROM creatures ORDER BY id LIMIT ?1 OFFSET ?2"
                ))
                .map_err(|e| backend("Failed to prepare list query", e))?;

            let rows = stmt
                .query_map(params![i64::from(limit), i64::from(skip)], row_to_creature)
                .map_err(|e| backend("Failed to list creatures", e))?;

            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| backend("Failed to read creature row", e))
        })
        .await
    }

    async fn update(&self, id: i64, update: CreatureUpdate) -> Result<Creature, StoreError> {
        self.with_connection(move |conn| {
            let current = select_by_id(conn, id)?.ok_or(StoreError::NotFound { id })?;
            let updated = update.apply_to(&current);

            conn.execute(
                "UPDATE creatures SET name = ?1, scientific_name = ?2, description = ?3, \
                 type = ?4, gender_ratio = ?5, kingdom = ?6, classification = ?7, family = ?8, \
                 height_cm = ?9, weight_kg = ?10, body_shape = ?11, image_path = ?12 \
                 WHERE id = ?13",
                params![
                    updated.name,
                    updated.scientific_name,
                    updated.description,
                    updated.creature_type,
                    updated.gender_ratio,
                    updated.kingdom,
                    updated.classification,
                    updated.family,
                    updated.height_cm,
                    updated.weight_kg,
                    updated.body_shape.as_str(),
                    updated.image_path,
                    id,
                ],
            )
            .map_err(|e| map_write_error(e, &updated.name, &updated.scientific_name))?;

            Ok(updated)
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.with_connection(move |conn| {
            let deleted = conn
                .execute("DELETE FROM creatures WHERE id = ?1", params![id])
                .map_err(|e| backend("Failed to delete creature", e))?;
            if deleted == 0 {
                return Err(StoreError::NotFound { id });
            }
            Ok(())
        })
        .await
    }
}
