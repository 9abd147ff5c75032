//! Repository Pattern for the household directory
//!
//! Business logic talks to [`DirectoryRepository`]; the HTTP layer and the
//! export pipeline never see SQL.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              HTTP handlers / export command                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   DirectoryRepository                       │
//! └─────────────────────────────────────────────────────────────┘
//!                   │                         │
//!                   ▼                         ▼
//!         ┌─────────────────┐       ┌─────────────────┐
//!         │     SQLite      │       │      Mock       │
//!         │  Implementation │       │ Implementation  │
//!         └─────────────────┘       └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use kudumbam::storage::{DirectoryRepository, SqliteDirectoryRepository};
//!
//! let repo = SqliteDirectoryRepository::new("data/directory.db")?;
//! let stored = repo.create(&household)?;
//! let page = repo.list(&ListQuery::default())?;
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::models::{sort_members, Household, Member};

use super::error::{StorageError, StorageResult};

/// Page size used when the query names none
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: usize = 100;

// ============================================================================
// Query Types
// ============================================================================

/// Column used to order the household listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    HouseNumber,
    AddressEn,
    Phone,
    Id,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            Self::HouseNumber => "house_number",
            Self::AddressEn => "address_en",
            Self::Phone => "phone",
            Self::Id => "id",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Household listing query
///
/// `search` matches case-insensitively anywhere in the house number, either
/// address or the phone number. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: SortField::default(),
            order: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Query with out-of-range paging clamped and blank search dropped
    pub fn normalized(&self) -> Self {
        Self {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort_by: self.sort_by,
            order: self.order,
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows skipped before this page, saturating for pages far past the end
    fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// One page of results with the total match count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, total: usize, query: &ListQuery) -> Self {
        Self {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
            total_pages: total.div_ceil(query.page_size),
        }
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Storage for households and their members
///
/// Reads return members head first, then by identifier. Nothing here enforces
/// a single head per household; that is left to form validation.
pub trait DirectoryRepository: Send + Sync {
    /// Store a new household with its members
    fn create(&self, household: &Household) -> StorageResult<Household>;

    /// Replace a household's fields and reconcile its members
    ///
    /// Members with an identifier are updated, members without one are
    /// inserted, and stored members missing from `household` are deleted.
    fn update(&self, id: i64, household: &Household) -> StorageResult<Household>;

    /// Delete a household and its members, returning what was removed
    fn delete(&self, id: i64) -> StorageResult<Household>;

    /// Household with members
    fn get(&self, id: i64) -> StorageResult<Option<Household>>;

    /// Search, sort and paginate households (without members)
    fn list(&self, query: &ListQuery) -> StorageResult<Page<Household>>;

    /// Every household with members, ordered by house number
    fn snapshot(&self) -> StorageResult<Vec<Household>>;

    /// Number of stored households
    fn count(&self) -> StorageResult<usize>;
}

/// Thread-safe shared repository
pub type SharedDirectoryRepository = Arc<dyn DirectoryRepository>;

// ============================================================================
// SQLite Implementation
// ============================================================================

const HOUSEHOLD_COLUMNS: &str =
    "id, house_number, address_en, address_ml, phone, photo_url, is_on_rent, owner_name";

const MEMBER_COLUMNS: &str = "id, household_id, name_en, name_ml, relationship_en, relationship_ml, \
     occupation_en, occupation_ml, age, dob, blood_group, is_head";

const DOB_FORMAT: &str = "%Y-%m-%d";

/// SQLite implementation of DirectoryRepository
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteDirectoryRepository {
    conn: Mutex<Connection>,
}

impl SqliteDirectoryRepository {
    /// Open (or create) a database file
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite repository initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create database schema
    fn create_schema(&self) -> StorageResult<()> {
        let conn = self.lock();
        conn.execute_batch(
            r#"
                PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS households (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    house_number TEXT NOT NULL,
                    address_en TEXT NOT NULL,
                    address_ml TEXT NOT NULL DEFAULT '',
                    phone TEXT NOT NULL DEFAULT '',
                    photo_url TEXT,
                    is_on_rent INTEGER NOT NULL DEFAULT 0,
                    owner_name TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS members (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    household_id INTEGER NOT NULL
                        REFERENCES households(id) ON DELETE CASCADE,
                    name_en TEXT NOT NULL DEFAULT '',
                    name_ml TEXT NOT NULL DEFAULT '',
                    relationship_en TEXT NOT NULL DEFAULT '',
                    relationship_ml TEXT NOT NULL DEFAULT '',
                    occupation_en TEXT NOT NULL DEFAULT '',
                    occupation_ml TEXT NOT NULL DEFAULT '',
                    age INTEGER,
                    dob TEXT,
                    blood_group TEXT NOT NULL DEFAULT '',
                    is_head INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX IF NOT EXISTS idx_households_house_number ON households(house_number);
                CREATE INDEX IF NOT EXISTS idx_members_household ON members(household_id);
            "#,
        )?;
        Ok(())
    }
}

fn household_from_row(row: &Row<'_>) -> rusqlite::Result<Household> {
    Ok(Household {
        id: Some(row.get(0)?),
        house_number: row.get(1)?,
        address_en: row.get(2)?,
        address_ml: row.get(3)?,
        phone: row.get(4)?,
        photo_url: row.get(5)?,
        is_on_rent: row.get(6)?,
        owner_name: row.get(7)?,
        members: Vec::new(),
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    let dob: Option<String> = row.get(9)?;
    Ok(Member {
        id: Some(row.get(0)?),
        household_id: Some(row.get(1)?),
        name_en: row.get(2)?,
        name_ml: row.get(3)?,
        relationship_en: row.get(4)?,
        relationship_ml: row.get(5)?,
        occupation_en: row.get(6)?,
        occupation_ml: row.get(7)?,
        age: row.get(8)?,
        dob: dob.and_then(|d| NaiveDate::parse_from_str(&d, DOB_FORMAT).ok()),
        blood_group: row.get(10)?,
        is_head: row.get(11)?,
    })
}

fn insert_member(conn: &Connection, household_id: i64, m: &Member) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO members (household_id, name_en, name_ml, relationship_en, relationship_ml,
             occupation_en, occupation_ml, age, dob, blood_group, is_head)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            household_id,
            m.name_en,
            m.name_ml,
            m.relationship_en,
            m.relationship_ml,
            m.occupation_en,
            m.occupation_ml,
            m.age,
            m.dob.map(|d| d.format(DOB_FORMAT).to_string()),
            m.blood_group,
            m.is_head,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_member(conn: &Connection, member_id: i64, m: &Member) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE members SET name_en = ?2, name_ml = ?3, relationship_en = ?4, relationship_ml = ?5,
             occupation_en = ?6, occupation_ml = ?7, age = ?8, dob = ?9, blood_group = ?10,
             is_head = ?11
         WHERE id = ?1",
        params![
            member_id,
            m.name_en,
            m.name_ml,
            m.relationship_en,
            m.relationship_ml,
            m.occupation_en,
            m.occupation_ml,
            m.age,
            m.dob.map(|d| d.format(DOB_FORMAT).to_string()),
            m.blood_group,
            m.is_head,
        ],
    )?;
    Ok(())
}

fn load_members(conn: &Connection, household_id: i64) -> rusqlite::Result<Vec<Member>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE household_id = ?1 ORDER BY is_head DESC, id ASC"
    ))?;
    let members = stmt
        .query_map([household_id], member_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(members)
}

fn load_household(conn: &Connection, id: i64) -> rusqlite::Result<Option<Household>> {
    let household = conn
        .query_row(
            &format!("SELECT {HOUSEHOLD_COLUMNS} FROM households WHERE id = ?1"),
            [id],
            household_from_row,
        )
        .optional()?;

    match household {
        Some(mut household) => {
            household.members = load_members(conn, id)?;
            Ok(Some(household))
        }
        None => Ok(None),
    }
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(search: Option<&str>) -> String {
    match search {
        Some(term) => {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        }
        None => "%".to_string(),
    }
}

const SEARCH_FILTER: &str = "WHERE house_number LIKE ?1 ESCAPE '\\' \
     OR address_en LIKE ?1 ESCAPE '\\' \
     OR address_ml LIKE ?1 ESCAPE '\\' \
     OR phone LIKE ?1 ESCAPE '\\'";

impl DirectoryRepository for SqliteDirectoryRepository {
    fn create(&self, household: &Household) -> StorageResult<Household> {
        let mut conn = self.lock();
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO households (house_number, address_en, address_ml, phone, photo_url,
                 is_on_rent, owner_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                household.house_number,
                household.address_en,
                household.address_ml,
                household.phone,
                household.photo_url,
                household.is_on_rent,
                household.owner_name,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();

        for member in &household.members {
            insert_member(&tx, id, member)?;
        }
        tx.commit()?;

        tracing::debug!(id, members = household.members.len(), "Household created");
        load_household(&conn, id)?.ok_or(StorageError::not_found(id))
    }

    fn update(&self, id: i64, household: &Household) -> StorageResult<Household> {
        let mut conn = self.lock();
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE households SET house_number = ?2, address_en = ?3, address_ml = ?4,
                 phone = ?5, photo_url = ?6, is_on_rent = ?7, owner_name = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                id,
                household.house_number,
                household.address_en,
                household.address_ml,
                household.phone,
                household.photo_url,
                household.is_on_rent,
                household.owner_name,
                now,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::not_found(id));
        }

        let existing: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM members WHERE household_id = ?1")?;
            let ids = stmt
                .query_map([id], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        };

        let mut kept = Vec::with_capacity(household.members.len());
        for member in &household.members {
            match member.id {
                Some(member_id) if existing.contains(&member_id) => {
                    update_member(&tx, member_id, member)?;
                    kept.push(member_id);
                }
                Some(member_id) => {
                    return Err(StorageError::ForeignMember {
                        member_id,
                        household_id: id,
                    });
                }
                None => {
                    kept.push(insert_member(&tx, id, member)?);
                }
            }
        }

        let mut removed = 0;
        for stale in existing.iter().filter(|m| !kept.contains(m)) {
            removed += tx.execute("DELETE FROM members WHERE id = ?1", [stale])?;
        }
        tx.commit()?;

        tracing::debug!(id, members = kept.len(), removed, "Household updated");
        load_household(&conn, id)?.ok_or(StorageError::not_found(id))
    }

    fn delete(&self, id: i64) -> StorageResult<Household> {
        let mut conn = self.lock();
        let household = load_household(&conn, id)?.ok_or(StorageError::not_found(id))?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM members WHERE household_id = ?1", [id])?;
        tx.execute("DELETE FROM households WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::debug!(id, "Household deleted");
        Ok(household)
    }

    fn get(&self, id: i64) -> StorageResult<Option<Household>> {
        let conn = self.lock();
        Ok(load_household(&conn, id)?)
    }

    fn list(&self, query: &ListQuery) -> StorageResult<Page<Household>> {
        let query = query.normalized();
        let pattern = like_pattern(query.search.as_deref());
        let conn = self.lock();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM households {SEARCH_FILTER}"),
            [&pattern],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {HOUSEHOLD_COLUMNS} FROM households {SEARCH_FILTER}
             ORDER BY {} {}, id ASC LIMIT ?2 OFFSET ?3",
            query.sort_by.column(),
            query.order.keyword(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                params![
                    pattern,
                    query.page_size as i64,
                    i64::try_from(query.offset()).unwrap_or(i64::MAX)
                ],
                household_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as usize, &query))
    }

    fn snapshot(&self) -> StorageResult<Vec<Household>> {
        let conn = self.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {HOUSEHOLD_COLUMNS} FROM households ORDER BY house_number ASC, id ASC"
        ))?;
        let mut households = stmt
            .query_map([], household_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY household_id, is_head DESC, id ASC"
        ))?;
        let mut by_household: HashMap<i64, Vec<Member>> = HashMap::new();
        for member in stmt.query_map([], member_from_row)? {
            let member = member?;
            if let Some(household_id) = member.household_id {
                by_household.entry(household_id).or_default().push(member);
            }
        }

        for household in &mut households {
            if let Some(id) = household.id {
                household.members = by_household.remove(&id).unwrap_or_default();
            }
        }

        Ok(households)
    }

    fn count(&self) -> StorageResult<usize> {
        let conn = self.lock();
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM households", [], |row| row.get(0))?;
        Ok(total as usize)
    }
}

// ============================================================================
// Mock Implementation
// ============================================================================

#[derive(Default)]
struct MockState {
    households: BTreeMap<i64, Household>,
    next_household: i64,
    next_member: i64,
}

impl MockState {
    fn assign_member(&mut self, household_id: i64, member: &Member) -> Member {
        self.next_member += 1;
        Member {
            id: Some(self.next_member),
            household_id: Some(household_id),
            ..member.clone()
        }
    }
}

/// In-memory mock implementation of DirectoryRepository
#[derive(Default)]
pub struct MockDirectoryRepository {
    state: Mutex<MockState>,
}

impl MockDirectoryRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn matches_search(household: &Household, term: &str) -> bool {
    let term = term.to_lowercase();
    [
        &household.house_number,
        &household.address_en,
        &household.address_ml,
        &household.phone,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

fn compare_by(field: SortField, a: &Household, b: &Household) -> Ordering {
    match field {
        SortField::HouseNumber => a.house_number.cmp(&b.house_number),
        SortField::AddressEn => a.address_en.cmp(&b.address_en),
        SortField::Phone => a.phone.cmp(&b.phone),
        SortField::Id => a.id.cmp(&b.id),
    }
}

impl DirectoryRepository for MockDirectoryRepository {
    fn create(&self, household: &Household) -> StorageResult<Household> {
        let mut state = self.lock();
        state.next_household += 1;
        let id = state.next_household;

        let mut members: Vec<Member> = household
            .members
            .iter()
            .map(|m| state.assign_member(id, m))
            .collect();
        sort_members(&mut members);

        let stored = Household {
            id: Some(id),
            members,
            ..household.clone()
        };
        state.households.insert(id, stored.clone());
        Ok(stored)
    }

    fn update(&self, id: i64, household: &Household) -> StorageResult<Household> {
        let mut state = self.lock();
        let existing: Vec<i64> = state
            .households
            .get(&id)
            .ok_or(StorageError::not_found(id))?
            .members
            .iter()
            .filter_map(|m| m.id)
            .collect();

        let mut members = Vec::with_capacity(household.members.len());
        for member in &household.members {
            match member.id {
                Some(member_id) if existing.contains(&member_id) => members.push(Member {
                    household_id: Some(id),
                    ..member.clone()
                }),
                Some(member_id) => {
                    return Err(StorageError::ForeignMember {
                        member_id,
                        household_id: id,
                    })
                }
                None => members.push(state.assign_member(id, member)),
            }
        }
        sort_members(&mut members);

        let stored = Household {
            id: Some(id),
            members,
            ..household.clone()
        };
        state.households.insert(id, stored.clone());
        Ok(stored)
    }

    fn delete(&self, id: i64) -> StorageResult<Household> {
        self.lock()
            .households
            .remove(&id)
            .ok_or(StorageError::not_found(id))
    }

    fn get(&self, id: i64) -> StorageResult<Option<Household>> {
        Ok(self.lock().households.get(&id).cloned())
    }

    fn list(&self, query: &ListQuery) -> StorageResult<Page<Household>> {
        let query = query.normalized();
        let state = self.lock();

        let mut matches: Vec<&Household> = state
            .households
            .values()
            .filter(|h| {
                query
                    .search
                    .as_deref()
                    .map_or(true, |term| matches_search(h, term))
            })
            .collect();

        matches.sort_by(|a, b| {
            let primary = compare_by(query.sort_by, a, b);
            let primary = match query.order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let total = matches.len();
        let items = matches
            .into_iter()
            .skip(query.offset())
            .take(query.page_size)
            .map(|h| Household {
                members: Vec::new(),
                ..h.clone()
            })
            .collect();

        Ok(Page::new(items, total, &query))
    }

    fn snapshot(&self) -> StorageResult<Vec<Household>> {
        let state = self.lock();
        let mut households: Vec<Household> = state.households.values().cloned().collect();
        households.sort_by(|a, b| {
            a.house_number
                .cmp(&b.house_number)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(households)
    }

    fn count(&self) -> StorageResult<usize> {
        Ok(self.lock().households.len())
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create a SQLite-backed repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> StorageResult<SharedDirectoryRepository> {
    Ok(Arc::new(SqliteDirectoryRepository::new(path)?))
}

/// Create a mock repository (for testing)
pub fn create_mock_repository() -> SharedDirectoryRepository {
    Arc::new(MockDirectoryRepository::new())
}
