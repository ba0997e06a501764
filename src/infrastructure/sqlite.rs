// src/infrastructure/sqlite.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::functions::{Context as FunctionContext, FunctionFlags};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::application::{BrowseQuery, BrowseScope, CategoryRepository, FilterRepository};
use crate::domain::{
    Category, CategorySelector, ClearScope, DomainError, Filter, FilterPredicate, FilterSummary,
    MetricEvent, NewFilter, OwnerId, SortMode, SortValue, Subcategory, Visibility,
};
use crate::util::text::escape_like;
use crate::util::time::{parse_timestamp, timestamp_key};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    position    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_categories_owner ON categories (owner_id, position);

CREATE TABLE IF NOT EXISTS subcategories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL REFERENCES categories (id) ON DELETE CASCADE,
    owner_id    TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    position    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_subcategories_parent ON subcategories (category_id, position);

CREATE TABLE IF NOT EXISTS filters (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id       TEXT    NOT NULL,
    name           TEXT    NOT NULL,
    description    TEXT,
    config         TEXT    NOT NULL,
    category_id    INTEGER REFERENCES categories (id) ON DELETE SET NULL,
    subcategory_id INTEGER REFERENCES subcategories (id) ON DELETE SET NULL,
    position       INTEGER NOT NULL DEFAULT 0,
    visibility     TEXT    NOT NULL DEFAULT 'private'
                   CHECK (visibility IN ('public', 'private')),
    popularity     REAL    NOT NULL DEFAULT 0 CHECK (popularity >= 0),
    view_count     INTEGER NOT NULL DEFAULT 0,
    export_count   INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT    NOT NULL,
    updated_at     TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_filters_owner
    ON filters (owner_id, category_id, subcategory_id, position);
CREATE INDEX IF NOT EXISTS idx_filters_popularity ON filters (popularity DESC, id);
CREATE INDEX IF NOT EXISTS idx_filters_created ON filters (created_at DESC, id);
CREATE INDEX IF NOT EXISTS idx_filters_updated ON filters (updated_at DESC, id);
CREATE INDEX IF NOT EXISTS idx_filters_exports ON filters (export_count DESC, id);
";

const SUMMARY_COLUMNS: &str = "id, owner_id, name, description, category_id, subcategory_id, \
     position, visibility, popularity, view_count, export_count, created_at, updated_at";

const FILTER_COLUMNS: &str = "id, owner_id, name, description, category_id, subcategory_id, \
     position, visibility, popularity, view_count, export_count, created_at, updated_at, config";

/// SQLite-backed store for filters and the category tree.
///
/// Owns one connection for its lifetime; call [`SqliteRepository::close`] to
/// release it explicitly.
pub struct SqliteRepository {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteRepository {
    pub fn open<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let path = PathBuf::from(database_path.as_ref());
        debug!(?path, "Opening filter database");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let repository = Self::initialize(conn, Some(path.clone()))?;

        info!(?path, "Opened filter database");
        Ok(repository)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::initialize(conn, None)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;
        conn.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            fold_case,
        )
        .context("Failed to register fold_case")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to apply database schema")?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")
    }
}

/// Unicode lower-casing for search; SQLite's own `LIKE` folds ASCII only.
fn fold_case(ctx: &FunctionContext<'_>) -> rusqlite::Result<Option<String>> {
    let text: Option<String> = ctx.get(0)?;
    Ok(text.map(|t| t.to_lowercase()))
}

fn storage(e: rusqlite::Error) -> DomainError {
    DomainError::storage(e.to_string())
}

fn conversion_error(idx: usize, err: DomainError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .ok_or_else(|| conversion_error(idx, DomainError::Validation(format!("bad timestamp '{raw}'"))))
}

fn visibility_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Visibility> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<FilterSummary> {
    Ok(FilterSummary {
        id: row.get(0)?,
        owner_id: OwnerId::new(row.get::<_, String>(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        category_id: row.get(4)?,
        subcategory_id: row.get(5)?,
        order: row.get(6)?,
        visibility: visibility_at(row, 7)?,
        popularity: row.get(8)?,
        view_count: row.get(9)?,
        export_count: row.get(10)?,
        created_at: timestamp_at(row, 11)?,
        updated_at: timestamp_at(row, 12)?,
    })
}

fn row_to_filter(row: &Row<'_>) -> rusqlite::Result<Filter> {
    let summary = row_to_summary(row)?;
    Ok(Filter {
        id: summary.id,
        owner_id: summary.owner_id,
        name: summary.name,
        description: summary.description,
        config: row.get(13)?,
        category_id: summary.category_id,
        subcategory_id: summary.subcategory_id,
        order: summary.order,
        visibility: summary.visibility,
        popularity: summary.popularity,
        view_count: summary.view_count,
        export_count: summary.export_count,
        created_at: summary.created_at,
        updated_at: summary.updated_at,
    })
}

fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        owner_id: OwnerId::new(row.get::<_, String>(1)?),
        name: row.get(2)?,
        order: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
    })
}

fn row_to_subcategory(row: &Row<'_>) -> rusqlite::Result<Subcategory> {
    Ok(Subcategory {
        id: row.get(0)?,
        category_id: row.get(1)?,
        owner_id: OwnerId::new(row.get::<_, String>(2)?),
        name: row.get(3)?,
        order: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
    })
}

fn sort_column(sort: SortMode) -> &'static str {
    match sort {
        SortMode::Popular => "popularity",
        SortMode::New => "created_at",
        SortMode::Updated => "updated_at",
        SortMode::MostUsed => "export_count",
    }
}

fn sort_value_param(value: &SortValue) -> Value {
    match value {
        SortValue::Int(i) => Value::Integer(*i),
        SortValue::Float(f) => Value::Real(*f),
        SortValue::Text(s) => Value::Text(s.clone()),
    }
}

/// Render an owner-scoped predicate as a WHERE fragment, pushing its params.
pub(crate) fn predicate_clause(predicate: &FilterPredicate, params: &mut Vec<Value>) -> String {
    params.push(Value::Text(predicate.owner().as_str().to_string()));
    let selector = match predicate.selector() {
        CategorySelector::Main(id) => {
            params.push(Value::Integer(id));
            " AND category_id = ? AND subcategory_id IS NULL"
        }
        CategorySelector::Sub(id) => {
            params.push(Value::Integer(id));
            " AND subcategory_id = ?"
        }
        CategorySelector::Uncategorized => " AND category_id IS NULL AND subcategory_id IS NULL",
        CategorySelector::All => "",
    };
    format!("owner_id = ?{selector}")
}

/// Build the keyset query: sort value descending, id ascending, strictly
/// after the cursor.
pub(crate) fn browse_statement(query: &BrowseQuery) -> (String, Vec<Value>) {
    let column = sort_column(query.sort);
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    match &query.scope {
        BrowseScope::Public => clauses.push("visibility = 'public'".to_string()),
        BrowseScope::Owned(predicate) => clauses.push(predicate_clause(predicate, &mut params)),
    }

    if let Some(term) = &query.search {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        clauses.push(
            "(fold_case(name) LIKE ? ESCAPE '\\' \
             OR fold_case(IFNULL(description, '')) LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }

    if let Some(cursor) = &query.after {
        clauses.push(format!("({column} < ? OR ({column} = ? AND id > ?))"));
        params.push(sort_value_param(&cursor.v));
        params.push(sort_value_param(&cursor.v));
        params.push(Value::Integer(cursor.id));
    }

    params.push(Value::Integer(query.limit as i64));
    let sql = format!(
        "SELECT {SUMMARY_COLUMNS} FROM filters WHERE {} ORDER BY {column} DESC, id ASC LIMIT ?",
        clauses.join(" AND ")
    );
    (sql, params)
}

impl FilterRepository for SqliteRepository {
    #[instrument(level = "debug", skip(self, new))]
    fn insert_filter(
        &mut self,
        owner: &OwnerId,
        new: &NewFilter,
        order: i64,
        now: DateTime<Utc>,
    ) -> Result<Filter, DomainError> {
        let ts = timestamp_key(&now);
        self.conn
            .execute(
                "INSERT INTO filters (owner_id, name, description, config, position, visibility, \
                 created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    owner.as_str(),
                    new.name,
                    new.description,
                    new.config,
                    order,
                    new.visibility.as_str(),
                    ts
                ],
            )
            .map_err(storage)?;
        let id = self.conn.last_insert_rowid();

        self.get_filter(id)?
            .ok_or_else(|| DomainError::storage(format!("inserted filter {id} vanished")))
    }

    #[instrument(level = "debug", skip(self))]
    fn get_filter(&mut self, id: i64) -> Result<Option<Filter>, DomainError> {
        self.conn
            .query_row(
                &format!("SELECT {FILTER_COLUMNS} FROM filters WHERE id = ?1"),
                params![id],
                row_to_filter,
            )
            .optional()
            .map_err(storage)
    }

    fn save_filter(&mut self, filter: &Filter) -> Result<(), DomainError> {
        let changed = self
            .conn
            .execute(
                "UPDATE filters SET name = ?1, description = ?2, config = ?3, visibility = ?4, \
                 updated_at = ?5 WHERE id = ?6 AND owner_id = ?7",
                params![
                    filter.name,
                    filter.description,
                    filter.config,
                    filter.visibility.as_str(),
                    timestamp_key(&filter.updated_at),
                    filter.id,
                    filter.owner_id.as_str()
                ],
            )
            .map_err(storage)?;
        if changed == 0 {
            return Err(DomainError::FilterNotFound(filter.id));
        }
        Ok(())
    }

    fn delete_filter(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM filters WHERE id = ?1 AND owner_id = ?2",
                params![id, owner.as_str()],
            )
            .map_err(storage)?;
        Ok(changed > 0)
    }

    #[instrument(level = "debug", skip(self))]
    fn browse_filters(&mut self, query: &BrowseQuery) -> Result<Vec<FilterSummary>, DomainError> {
        let (sql, params) = browse_statement(query);
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let rows = stmt
            .query_map(params_from_iter(params), row_to_summary)
            .map_err(storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }

    #[instrument(level = "debug", skip(self))]
    fn list_filters(
        &mut self,
        predicate: &FilterPredicate,
    ) -> Result<Vec<FilterSummary>, DomainError> {
        let mut params = Vec::new();
        let clause = predicate_clause(predicate, &mut params);
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM filters WHERE {clause} ORDER BY position ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let rows = stmt
            .query_map(params_from_iter(params), row_to_summary)
            .map_err(storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }

    fn next_order(&mut self, predicate: &FilterPredicate) -> Result<i64, DomainError> {
        let mut params = Vec::new();
        let clause = predicate_clause(predicate, &mut params);
        self.conn
            .query_row(
                &format!("SELECT COALESCE(MAX(position), -1) + 1 FROM filters WHERE {clause}"),
                params_from_iter(params),
                |row| row.get(0),
            )
            .map_err(storage)
    }

    fn set_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        category_id: i64,
        subcategory_id: Option<i64>,
        order: i64,
    ) -> Result<bool, DomainError> {
        let changed = self
            .conn
            .execute(
                "UPDATE filters SET category_id = ?1, subcategory_id = ?2, position = ?3 \
                 WHERE id = ?4 AND owner_id = ?5",
                params![category_id, subcategory_id, order, id, owner.as_str()],
            )
            .map_err(storage)?;
        Ok(changed > 0)
    }

    #[instrument(level = "debug", skip(self))]
    fn clear_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        scope: ClearScope,
    ) -> Result<bool, DomainError> {
        // The filter goes to the end of the bucket it lands in
        let sql = match scope {
            ClearScope::All => {
                "UPDATE filters SET category_id = NULL, subcategory_id = NULL, position = \
                 (SELECT COALESCE(MAX(f.position), -1) + 1 FROM filters f \
                  WHERE f.owner_id = ?2 AND f.category_id IS NULL AND f.subcategory_id IS NULL \
                    AND f.id <> ?1) \
                 WHERE id = ?1 AND owner_id = ?2"
            }
            ClearScope::SubcategoryOnly => {
                "UPDATE filters SET subcategory_id = NULL, position = \
                 (SELECT COALESCE(MAX(f.position), -1) + 1 FROM filters f \
                  WHERE f.owner_id = ?2 AND f.category_id IS filters.category_id \
                    AND f.subcategory_id IS NULL AND f.id <> ?1) \
                 WHERE id = ?1 AND owner_id = ?2"
            }
        };
        let changed = self
            .conn
            .execute(sql, params![id, owner.as_str()])
            .map_err(storage)?;
        Ok(changed > 0)
    }

    fn set_order(&mut self, id: i64, owner: &OwnerId, order: i64) -> Result<bool, DomainError> {
        let changed = self
            .conn
            .execute(
                "UPDATE filters SET position = ?1 WHERE id = ?2 AND owner_id = ?3",
                params![order, id, owner.as_str()],
            )
            .map_err(storage)?;
        Ok(changed > 0)
    }

    #[instrument(level = "debug", skip(self))]
    fn record_metric(&mut self, id: i64, event: MetricEvent) -> Result<bool, DomainError> {
        let sql = match event {
            MetricEvent::View => {
                "UPDATE filters SET view_count = view_count + 1, popularity = popularity + ?1 \
                 WHERE id = ?2"
            }
            MetricEvent::Export => {
                "UPDATE filters SET export_count = export_count + 1, popularity = popularity + ?1 \
                 WHERE id = ?2"
            }
        };
        let changed = self
            .conn
            .execute(sql, params![event.popularity_delta(), id])
            .map_err(storage)?;
        Ok(changed > 0)
    }
}

impl CategoryRepository for SqliteRepository {
    #[instrument(level = "debug", skip(self))]
    fn insert_category(
        &mut self,
        owner: &OwnerId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Category, DomainError> {
        self.conn
            .execute(
                "INSERT INTO categories (owner_id, name, position, created_at) \
                 VALUES (?1, ?2, \
                 (SELECT COALESCE(MAX(position), -1) + 1 FROM categories WHERE owner_id = ?1), ?3)",
                params![owner.as_str(), name, timestamp_key(&now)],
            )
            .map_err(storage)?;
        let id = self.conn.last_insert_rowid();

        self.get_category(id)?
            .ok_or_else(|| DomainError::storage(format!("inserted category {id} vanished")))
    }

    #[instrument(level = "debug", skip(self))]
    fn insert_subcategory(
        &mut self,
        parent: &Category,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Subcategory, DomainError> {
        self.conn
            .execute(
                "INSERT INTO subcategories (category_id, owner_id, name, position, created_at) \
                 VALUES (?1, ?2, ?3, \
                 (SELECT COALESCE(MAX(position), -1) + 1 FROM subcategories WHERE category_id = ?1), ?4)",
                params![parent.id, parent.owner_id.as_str(), name, timestamp_key(&now)],
            )
            .map_err(storage)?;
        let id = self.conn.last_insert_rowid();

        self.get_subcategory(id)?
            .ok_or_else(|| DomainError::storage(format!("inserted subcategory {id} vanished")))
    }

    fn get_category(&mut self, id: i64) -> Result<Option<Category>, DomainError> {
        self.conn
            .query_row(
                "SELECT id, owner_id, name, position, created_at FROM categories WHERE id = ?1",
                params![id],
                row_to_category,
            )
            .optional()
            .map_err(storage)
    }

    fn get_subcategory(&mut self, id: i64) -> Result<Option<Subcategory>, DomainError> {
        self.conn
            .query_row(
                "SELECT id, category_id, owner_id, name, position, created_at \
                 FROM subcategories WHERE id = ?1",
                params![id],
                row_to_subcategory,
            )
            .optional()
            .map_err(storage)
    }

    fn list_categories(&mut self, owner: &OwnerId) -> Result<Vec<Category>, DomainError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, owner_id, name, position, created_at FROM categories \
                 WHERE owner_id = ?1 ORDER BY position ASC, id ASC",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![owner.as_str()], row_to_category)
            .map_err(storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }

    fn list_subcategories(&mut self, category_id: i64) -> Result<Vec<Subcategory>, DomainError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, category_id, owner_id, name, position, created_at FROM subcategories \
                 WHERE category_id = ?1 ORDER BY position ASC, id ASC",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![category_id], row_to_subcategory)
            .map_err(storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }

    fn rename_category(
        &mut self,
        id: i64,
        owner: &OwnerId,
        name: &str,
    ) -> Result<bool, DomainError> {
        let changed = self
            .conn
            .execute(
                "UPDATE categories SET name = ?1 WHERE id = ?2 AND owner_id = ?3",
                params![name, id, owner.as_str()],
            )
            .map_err(storage)?;
        Ok(changed > 0)
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_category(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        let tx = self.conn.transaction().map_err(storage)?;

        let owned: bool = tx
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM categories WHERE id = ?1 AND owner_id = ?2)",
                params![id, owner.as_str()],
                |row| row.get(0),
            )
            .map_err(storage)?;
        if !owned {
            return Ok(false);
        }

        let released = tx
            .execute(
                "UPDATE filters SET category_id = NULL, subcategory_id = NULL \
                 WHERE category_id = ?1 \
                    OR subcategory_id IN (SELECT id FROM subcategories WHERE category_id = ?1)",
                params![id],
            )
            .map_err(storage)?;
        tx.execute("DELETE FROM subcategories WHERE category_id = ?1", params![id])
            .map_err(storage)?;
        tx.execute("DELETE FROM categories WHERE id = ?1", params![id])
            .map_err(storage)?;
        tx.commit().map_err(storage)?;

        debug!(category_id = id, released, "Released filters of deleted category");
        Ok(true)
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_subcategory(&mut self, id: i64, owner: &OwnerId) -> Result<bool, DomainError> {
        let tx = self.conn.transaction().map_err(storage)?;

        tx.execute(
            "UPDATE filters SET subcategory_id = NULL WHERE subcategory_id = ?1 AND owner_id = ?2",
            params![id, owner.as_str()],
        )
        .map_err(storage)?;
        let deleted = tx
            .execute(
                "DELETE FROM subcategories WHERE id = ?1 AND owner_id = ?2",
                params![id, owner.as_str()],
            )
            .map_err(storage)?;
        if deleted == 0 {
            // dropping the transaction rolls back the filter update
            return Ok(false);
        }
        tx.commit().map_err(storage)?;
        Ok(true)
    }
}
