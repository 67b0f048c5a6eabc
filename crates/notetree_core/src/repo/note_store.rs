//! Note/user storage contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the read interface the finders consume and the write APIs the
//!   surrounding application uses.
//! - Keep SQL details, slug assignment and path encoding inside the
//!   persistence boundary.
//!
//! # Invariants
//! - `fetch_notes` results are deterministic: `id ASC`.
//! - Slugs stay unique per `(user_id, slug)`; collisions are resolved by
//!   suffixing, never by failing the write.
//! - Subtree moves and deletes rewrite or remove every descendant row in the
//!   same transaction.

use crate::db::{latest_version, DbError};
use crate::model::ancestry::Ancestry;
use crate::model::note::{
    CreatedNote, NewNote, NewUser, NoteChanges, NoteId, NoteRecord, UserId, UserRecord,
};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    content,
    slug,
    user_id,
    ancestry,
    position,
    created_at,
    updated_at
FROM notes";

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    username,
    email,
    avatar_url,
    created_at,
    updated_at
FROM users";

static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid separator regex"));
static SLUG_INVALID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]").expect("valid slug filter regex"));

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage error for note/user persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Target note (or referenced parent) does not exist.
    NoteNotFound(NoteId),
    /// Referenced owner does not exist.
    UserNotFound(UserId),
    /// Re-parenting would place a note under itself or its own subtree.
    AncestryCycle(NoteId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::AncestryCycle(id) => {
                write!(f, "note {id} cannot be moved under its own subtree")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "note store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "note store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "note store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ancestry filter applied by [`NoteStore::fetch_notes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AncestryScope {
    /// No ancestry constraint.
    #[default]
    Any,
    /// Only notes without ancestors.
    RootsOnly,
    /// Only notes nested under another note.
    NonRootsOnly,
}

/// Criteria for listing notes. All fields are ANDed.
///
/// An explicitly supplied empty id/owner/slug set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub ids: Option<Vec<NoteId>>,
    pub user_ids: Option<Vec<UserId>>,
    pub slugs: Option<Vec<String>>,
    pub ancestry: AncestryScope,
    /// SQL LIKE pattern matched case-sensitively against note content, with
    /// caller-supplied wildcards honored as written.
    pub content_like: Option<String>,
}

/// Read interface consumed by the finders.
pub trait NoteStore {
    /// Loads one note, reporting a distinguishable not-found condition.
    fn fetch_note(&self, id: NoteId) -> StoreResult<NoteRecord>;
    /// Lists notes matching every supplied criterion, ordered by `id ASC`.
    fn fetch_notes(&self, filter: &NoteFilter) -> StoreResult<Vec<NoteRecord>>;
    /// Loads users by id set; unknown ids are skipped.
    fn fetch_users(&self, ids: &[UserId]) -> StoreResult<Vec<UserRecord>>;
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Creates a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Creates one note, resolving its slug, path and sibling position.
    ///
    /// A requested slug is sanitized; absent one, the slug is derived from
    /// content (lowercased, whitespace collapsed to `_`), falling back to a
    /// generated token, and suffixed on collision. `position = None` appends
    /// after the existing siblings.
    pub fn create_note(&self, input: &NewNote) -> StoreResult<CreatedNote> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if !user_exists(&tx, input.user_id)? {
            return Err(StoreError::UserNotFound(input.user_id));
        }

        let ancestry = match input.parent_id {
            Some(parent_id) => {
                let parent =
                    load_note(&tx, parent_id)?.ok_or(StoreError::NoteNotFound(parent_id))?;
                parent.ancestry.child(parent.id)
            }
            None => Ancestry::root(),
        };

        let slug_base = input
            .slug
            .as_deref()
            .and_then(derive_slug)
            .or_else(|| derive_slug(&input.content))
            .unwrap_or_else(generated_slug);
        let slug = available_slug(&tx, input.user_id, &slug_base, None)?;
        let position = match input.position {
            Some(value) => value,
            None => next_position(&tx, input.user_id, &ancestry)?,
        };

        tx.execute(
            "INSERT INTO notes (content, slug, user_id, ancestry, position)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                input.content,
                slug,
                input.user_id,
                ancestry.encode(),
                position,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let note = load_note(&tx, id)?.ok_or_else(|| {
            StoreError::InvalidData("created note missing in read-back".to_string())
        })?;
        tx.commit()?;

        Ok(CreatedNote {
            note,
            temporary_key: input.temporary_key.clone(),
        })
    }

    /// Applies partial changes to one note and returns the stored result.
    ///
    /// A requested slug (or a content change) may reassign the stored slug,
    /// so callers reconcile against the returned record. Re-parenting moves
    /// the whole subtree and rewrites every descendant path in the same
    /// transaction.
    pub fn update_note(&self, id: NoteId, changes: &NoteChanges) -> StoreResult<NoteRecord> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_note(&tx, id)?.ok_or(StoreError::NoteNotFound(id))?;

        let (ancestry, reparented) = match changes.parent_id {
            None => (current.ancestry.clone(), false),
            Some(None) => (Ancestry::root(), true),
            Some(Some(parent_id)) => {
                if parent_id == id {
                    return Err(StoreError::AncestryCycle(id));
                }
                let parent =
                    load_note(&tx, parent_id)?.ok_or(StoreError::NoteNotFound(parent_id))?;
                if parent.ancestry.has_ancestor(id) {
                    return Err(StoreError::AncestryCycle(id));
                }
                (parent.ancestry.child(parent.id), true)
            }
        };

        let content = changes
            .content
            .clone()
            .unwrap_or_else(|| current.content.clone());
        let slug_base = changes
            .slug
            .as_deref()
            .and_then(derive_slug)
            .or_else(|| changes.content.as_deref().and_then(derive_slug));
        let slug = match slug_base {
            Some(base) if base != current.slug => {
                available_slug(&tx, current.user_id, &base, Some(id))?
            }
            _ => current.slug.clone(),
        };
        let position = match changes.position {
            Some(value) => value,
            None if reparented => next_position(&tx, current.user_id, &ancestry)?,
            None => current.position,
        };

        tx.execute(
            "UPDATE notes
             SET content = ?2,
                 slug = ?3,
                 ancestry = ?4,
                 position = ?5,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, content, slug, ancestry.encode(), position],
        )?;

        if reparented {
            for descendant in load_descendants(&tx, id)? {
                let rebased = descendant.ancestry.rebase(id, &ancestry);
                tx.execute(
                    "UPDATE notes
                     SET ancestry = ?2,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    params![descendant.id, rebased.encode()],
                )?;
            }
        }

        let updated = load_note(&tx, id)?.ok_or_else(|| {
            StoreError::InvalidData("updated note missing in read-back".to_string())
        })?;
        tx.commit()?;
        Ok(updated)
    }

    /// Deletes one note together with its whole subtree.
    pub fn delete_note(&self, id: NoteId) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_note(&tx, id)?.is_none() {
            return Err(StoreError::NoteNotFound(id));
        }

        let mut doomed: Vec<NoteId> = load_descendants(&tx, id)?
            .into_iter()
            .map(|record| record.id)
            .collect();
        doomed.push(id);

        let placeholders = vec!["?"; doomed.len()].join(", ");
        tx.execute(
            &format!("DELETE FROM notes WHERE id IN ({placeholders});"),
            params_from_iter(doomed.into_iter().map(Value::Integer)),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Creates one user.
    pub fn create_user(&self, input: &NewUser) -> StoreResult<UserRecord> {
        self.conn.execute(
            "INSERT INTO users (name, username, email, avatar_url)
             VALUES (?1, ?2, ?3, ?4);",
            params![input.name, input.username, input.email, input.avatar_url],
        )?;
        let id = self.conn.last_insert_rowid();
        load_user(self.conn, id)?.ok_or_else(|| {
            StoreError::InvalidData("created user missing in read-back".to_string())
        })
    }

    /// Loads one user by exact username.
    pub fn fetch_user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query([username])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn fetch_note(&self, id: NoteId) -> StoreResult<NoteRecord> {
        load_note(self.conn, id)?.ok_or(StoreError::NoteNotFound(id))
    }

    fn fetch_notes(&self, filter: &NoteFilter) -> StoreResult<Vec<NoteRecord>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(ids) = filter.ids.as_ref() {
            push_integer_set_clause(&mut sql, &mut bind_values, "id", ids);
        }
        if let Some(user_ids) = filter.user_ids.as_ref() {
            push_integer_set_clause(&mut sql, &mut bind_values, "user_id", user_ids);
        }
        if let Some(slugs) = filter.slugs.as_ref() {
            push_text_set_clause(&mut sql, &mut bind_values, "slug", slugs);
        }
        match filter.ancestry {
            AncestryScope::Any => {}
            AncestryScope::RootsOnly => sql.push_str(" AND ancestry IS NULL"),
            AncestryScope::NonRootsOnly => sql.push_str(" AND ancestry IS NOT NULL"),
        }
        if let Some(pattern) = filter.content_like.as_ref() {
            sql.push_str(" AND content LIKE ?");
            bind_values.push(Value::Text(pattern.clone()));
        }

        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn fetch_users(&self, ids: &[UserId]) -> StoreResult<Vec<UserRecord>> {
        let unique: BTreeSet<UserId> = ids.iter().copied().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; unique.len()].join(", ");
        let sql = format!("{USER_SELECT_SQL} WHERE id IN ({placeholders}) ORDER BY id ASC;");
        let bind_values: Vec<Value> = unique.into_iter().map(Value::Integer).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

/// Derives a URL-safe slug from note content.
///
/// Returns `None` when nothing usable remains after sanitization, in which
/// case the caller falls back to a generated token.
pub fn derive_slug(content: &str) -> Option<String> {
    let lowered = content.trim().to_lowercase();
    let separated = SLUG_SEPARATOR_RE.replace_all(&lowered, "_");
    let cleaned = SLUG_INVALID_RE.replace_all(&separated, "");
    let trimmed = cleaned
        .trim_matches(|c| c == '_' || c == '-')
        .to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn generated_slug() -> String {
    let token = Uuid::new_v4().simple().to_string();
    token[..10].to_string()
}

fn available_slug(
    conn: &Connection,
    user_id: UserId,
    base: &str,
    exclude: Option<NoteId>,
) -> StoreResult<String> {
    let mut candidate = base.to_string();
    while slug_taken(conn, user_id, &candidate, exclude)? {
        let token = Uuid::new_v4().simple().to_string();
        candidate = format!("{base}-{}", &token[..6]);
    }
    Ok(candidate)
}

fn slug_taken(
    conn: &Connection,
    user_id: UserId,
    slug: &str,
    exclude: Option<NoteId>,
) -> StoreResult<bool> {
    let taken: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM notes
            WHERE user_id = ?1
              AND slug = ?2
              AND id != COALESCE(?3, -1)
        );",
        params![user_id, slug, exclude],
        |row| row.get(0),
    )?;
    Ok(taken == 1)
}

fn next_position(conn: &Connection, user_id: UserId, ancestry: &Ancestry) -> StoreResult<i64> {
    let next = match ancestry.encode() {
        Some(path) => conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1
             FROM notes
             WHERE user_id = ?1
               AND ancestry = ?2;",
            params![user_id, path],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1
             FROM notes
             WHERE user_id = ?1
               AND ancestry IS NULL;",
            [user_id],
            |row| row.get(0),
        )?,
    };
    Ok(next)
}

fn user_exists(conn: &Connection, user_id: UserId) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_note(conn: &Connection, id: NoteId) -> StoreResult<Option<NoteRecord>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_note_row(row)?));
    }
    Ok(None)
}

fn load_user(conn: &Connection, id: UserId) -> StoreResult<Option<UserRecord>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn load_descendants(conn: &Connection, id: NoteId) -> StoreResult<Vec<NoteRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{NOTE_SELECT_SQL} WHERE ancestry IS NOT NULL ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut descendants = Vec::new();
    while let Some(row) = rows.next()? {
        let record = parse_note_row(row)?;
        if record.ancestry.has_ancestor(id) {
            descendants.push(record);
        }
    }
    Ok(descendants)
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<NoteRecord> {
    let ancestry_text: Option<String> = row.get("ancestry")?;
    Ok(NoteRecord {
        id: row.get("id")?,
        content: row.get("content")?,
        slug: row.get("slug")?,
        user_id: row.get("user_id")?,
        ancestry: Ancestry::decode(ancestry_text.as_deref()),
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_user_row(row: &Row<'_>) -> StoreResult<UserRecord> {
    Ok(UserRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        username: row.get("username")?,
        email: row.get("email")?,
        avatar_url: row.get("avatar_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn push_integer_set_clause(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    column: &str,
    values: &[i64],
) {
    let unique: BTreeSet<i64> = values.iter().copied().collect();
    if unique.is_empty() {
        sql.push_str(" AND 1 = 0");
        return;
    }
    let placeholders = vec!["?"; unique.len()].join(", ");
    sql.push_str(&format!(" AND {column} IN ({placeholders})"));
    bind_values.extend(unique.into_iter().map(Value::Integer));
}

fn push_text_set_clause(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    column: &str,
    values: &[String],
) {
    let unique: BTreeSet<String> = values.iter().cloned().collect();
    if unique.is_empty() {
        sql.push_str(" AND 1 = 0");
        return;
    }
    let placeholders = vec!["?"; unique.len()].join(", ");
    sql.push_str(&format!(" AND {column} IN ({placeholders})"));
    bind_values.extend(unique.into_iter().map(Value::Text));
}

fn ensure_note_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["users", "notes"] {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }

    for column in ["id", "name", "username", "email", "avatar_url"] {
        if !table_has_column(conn, "users", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }

    for column in ["id", "content", "slug", "user_id", "ancestry", "position"] {
        if !table_has_column(conn, "notes", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
