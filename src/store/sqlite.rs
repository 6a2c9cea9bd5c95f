use std::{collections::BTreeSet, str::FromStr};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row, Sqlite, SqlitePool,
};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::{
        Audience, Capacity, Posting, PostingKind, PostingStatus, Request, RequestOrigin,
        RequestStatus, Role, User,
    },
    AppError, AppResult,
};

use super::{CapacityGuard, PostingFilter, PostingStore, RequestStore, UserStore};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id        TEXT PRIMARY KEY,
        name      TEXT NOT NULL,
        role      TEXT NOT NULL,
        skills    TEXT NOT NULL DEFAULT '',
        interests TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS postings (
        id                  TEXT PRIMARY KEY,
        owner_id            TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        owner_role          TEXT NOT NULL,
        kind                TEXT NOT NULL,
        title               TEXT NOT NULL,
        description         TEXT NOT NULL DEFAULT '',
        terms               TEXT NOT NULL DEFAULT '',
        audience            TEXT NOT NULL,
        max_students        INTEGER NOT NULL DEFAULT 0,
        max_faculty         INTEGER NOT NULL DEFAULT 0,
        max_club_organizers INTEGER NOT NULL DEFAULT 0,
        strict_visibility   INTEGER NOT NULL DEFAULT 0,
        status              TEXT NOT NULL DEFAULT 'open',
        must_have           TEXT NOT NULL DEFAULT '[]',
        nice_to_have        TEXT NOT NULL DEFAULT '[]',
        apply_deadline      TEXT,
        created_at          TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS requests (
        id           TEXT PRIMARY KEY,
        posting_id   TEXT NOT NULL REFERENCES postings(id) ON DELETE CASCADE,
        requester_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        origin       TEXT NOT NULL,
        message      TEXT,
        status       TEXT NOT NULL DEFAULT 'pending',
        created_at   TEXT NOT NULL,
        UNIQUE(posting_id, requester_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_requests_posting_status
        ON requests(posting_id, status)",
];

const POSTING_COLUMNS: &str = "id, owner_id, owner_role, kind, title, description, terms, audience,
    max_students, max_faculty, max_club_organizers, strict_visibility, status,
    must_have, nice_to_have, apply_deadline, created_at";

const REQUEST_COLUMNS: &str = "id, posting_id, requester_id, origin, message, status, created_at";

/// `REQUEST_COLUMNS` for queries that join `requests r` against other tables.
const JOINED_REQUEST_COLUMNS: &str = "r.id AS id, r.posting_id AS posting_id,
    r.requester_id AS requester_id, r.origin AS origin, r.message AS message,
    r.status AS status, r.created_at AS created_at";

/// Accepted requests on a posting from requesters holding a given role.
const ACCEPTED_FOR_ROLE: &str = "SELECT COUNT(*) FROM requests r
    JOIN users u ON u.id = r.requester_id
    WHERE r.posting_id = ? AND r.status = 'accepted' AND u.role = ?";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and ensures the schema.
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::new(pool).await
    }

    pub async fn new(pool: SqlitePool) -> AppResult<Self> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Registration lives outside the engine; this is the hook it writes through.
    pub async fn insert_user(&self, user: &User) -> AppResult<()> {
        sqlx::query("INSERT INTO users (id,name,role,skills,interests) VALUES (?,?,?,?,?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(user.role.as_db())
            .bind(&user.skills)
            .bind(&user.interests)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn parse_uuid(row: &SqliteRow, column: &str) -> AppResult<Uuid> {
    let raw: String = row.try_get(column)?;
    Ok(Uuid::parse_str(&raw).with_context(|| format!("invalid uuid in {column}: {raw}"))?)
}

/// Enums are stored as their snake_case names.
trait Column: Copy + Into<&'static str> {
    fn as_db(self) -> &'static str {
        self.into()
    }
}

impl Column for Role {}
impl Column for Audience {}
impl Column for PostingKind {}
impl Column for PostingStatus {}
impl Column for RequestStatus {}
impl Column for RequestOrigin {}

fn parse_enum<T: FromStr<Err = strum::ParseError>>(row: &SqliteRow, column: &str) -> AppResult<T> {
    let raw: String = row.try_get(column)?;
    Ok(raw.parse().with_context(|| format!("unknown {column}: {raw}"))?)
}

fn parse_terms(row: &SqliteRow, column: &str) -> AppResult<BTreeSet<String>> {
    let raw: String = row.try_get(column)?;
    Ok(serde_json::from_str(&raw).with_context(|| format!("invalid term list in {column}"))?)
}

fn encode_terms(terms: &BTreeSet<String>) -> AppResult<String> {
    Ok(serde_json::to_string(terms).context("encode term list")?)
}

fn parse_count(row: &SqliteRow, column: &str) -> AppResult<u32> {
    let raw: i64 = row.try_get(column)?;
    Ok(u32::try_from(raw).with_context(|| format!("negative or oversized {column}: {raw}"))?)
}

fn map_user_row(row: &SqliteRow) -> AppResult<User> {
    Ok(User {
        id: parse_uuid(row, "id")?,
        name: row.try_get("name")?,
        role: parse_enum(row, "role")?,
        skills: row.try_get("skills")?,
        interests: row.try_get("interests")?,
    })
}

fn map_posting_row(row: &SqliteRow) -> AppResult<Posting> {
    Ok(Posting {
        id: parse_uuid(row, "id")?,
        owner_id: parse_uuid(row, "owner_id")?,
        owner_role: parse_enum(row, "owner_role")?,
        kind: parse_enum(row, "kind")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        terms: row.try_get("terms")?,
        audience: parse_enum(row, "audience")?,
        capacity: Capacity {
            students: parse_count(row, "max_students")?,
            faculty: parse_count(row, "max_faculty")?,
            club_organizers: parse_count(row, "max_club_organizers")?,
        },
        strict_visibility: row.try_get("strict_visibility")?,
        status: parse_enum(row, "status")?,
        must_have: parse_terms(row, "must_have")?,
        nice_to_have: parse_terms(row, "nice_to_have")?,
        apply_deadline: row.try_get::<Option<OffsetDateTime>, _>("apply_deadline")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_request_row(row: &SqliteRow) -> AppResult<Request> {
    Ok(Request {
        id: parse_uuid(row, "id")?,
        posting_id: parse_uuid(row, "posting_id")?,
        requester_id: parse_uuid(row, "requester_id")?,
        origin: parse_enum(row, "origin")?,
        message: row.try_get("message")?,
        status: parse_enum(row, "status")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query("SELECT id,name,role,skills,interests FROM users WHERE id=?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(map_user_row)
            .transpose()
    }

    async fn list_by_roles(&self, roles: &[Role]) -> AppResult<Vec<User>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT id,name,role,skills,interests FROM users WHERE role IN (");
        let mut separated = query.separated(", ");
        for role in roles {
            separated.push_bind(role.as_db());
        }
        separated.push_unseparated(") ORDER BY name ASC");

        query
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(map_user_row)
            .collect()
    }
}

#[async_trait]
impl PostingStore for SqliteStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<Posting>> {
        sqlx::query(&format!("SELECT {POSTING_COLUMNS} FROM postings WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(map_posting_row)
            .transpose()
    }

    async fn count_accepted(&self, posting_id: Uuid, role: Role) -> AppResult<u32> {
        let (count,): (i64,) = sqlx::query_as(ACCEPTED_FOR_ROLE)
            .bind(posting_id.to_string())
            .bind(role.as_db())
            .fetch_one(&self.pool)
            .await?;

        Ok(u32::try_from(count).context("accepted count out of range")?)
    }

    async fn list_open(&self, filter: &PostingFilter) -> AppResult<Vec<Posting>> {
        sqlx::query(&format!(
            "SELECT {POSTING_COLUMNS} FROM postings
             WHERE status = 'open'
               AND (?1 IS NULL OR owner_id = ?1)
               AND (?2 IS NULL OR kind = ?2)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.owner_id.map(|id| id.to_string()))
        .bind(filter.kind.map(|kind| kind.as_db()))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(map_posting_row)
        .collect()
    }

    async fn list_owned(&self, owner_id: Uuid) -> AppResult<Vec<Posting>> {
        sqlx::query(&format!(
            "SELECT {POSTING_COLUMNS} FROM postings
             WHERE owner_id=?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(map_posting_row)
        .collect()
    }

    async fn insert(&self, posting: &Posting) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO postings ({POSTING_COLUMNS})
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)"
        ))
        .bind(posting.id.to_string())
        .bind(posting.owner_id.to_string())
        .bind(posting.owner_role.as_db())
        .bind(posting.kind.as_db())
        .bind(&posting.title)
        .bind(&posting.description)
        .bind(&posting.terms)
        .bind(posting.audience.as_db())
        .bind(i64::from(posting.capacity.students))
        .bind(i64::from(posting.capacity.faculty))
        .bind(i64::from(posting.capacity.club_organizers))
        .bind(posting.strict_visibility)
        .bind(posting.status.as_db())
        .bind(encode_terms(&posting.must_have)?)
        .bind(encode_terms(&posting.nice_to_have)?)
        .bind(posting.apply_deadline)
        .bind(posting.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::NotFound,
            other => AppError::Store(other),
        })?;

        Ok(())
    }

    async fn update(&self, posting: &Posting) -> AppResult<bool> {
        let sql = format!(
            "UPDATE postings SET title=?, description=?, terms=?, audience=?,
                max_students=?, max_faculty=?, max_club_organizers=?, strict_visibility=?,
                must_have=?, nice_to_have=?, apply_deadline=?
             WHERE id=?
               AND ({ACCEPTED_FOR_ROLE}) <= ?
               AND ({ACCEPTED_FOR_ROLE}) <= ?
               AND ({ACCEPTED_FOR_ROLE}) <= ?"
        );

        let mut query = sqlx::query(&sql)
            .bind(&posting.title)
            .bind(&posting.description)
            .bind(&posting.terms)
            .bind(posting.audience.as_db())
            .bind(i64::from(posting.capacity.students))
            .bind(i64::from(posting.capacity.faculty))
            .bind(i64::from(posting.capacity.club_organizers))
            .bind(posting.strict_visibility)
            .bind(encode_terms(&posting.must_have)?)
            .bind(encode_terms(&posting.nice_to_have)?)
            .bind(posting.apply_deadline)
            .bind(posting.id.to_string());
        for role in Role::ALL {
            query = query
                .bind(posting.id.to_string())
                .bind(role.as_db())
                .bind(i64::from(posting.capacity.limit(role)));
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn close(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE postings SET status=? WHERE id=? AND status=?")
            .bind(PostingStatus::Closed.as_db())
            .bind(id.to_string())
            .bind(PostingStatus::Open.as_db())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl RequestStore for SqliteStore {
    async fn find(&self, posting_id: Uuid, requester_id: Uuid) -> AppResult<Option<Request>> {
        sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE posting_id=? AND requester_id=?"
        ))
        .bind(posting_id.to_string())
        .bind(requester_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(map_request_row)
        .transpose()
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Request>> {
        sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(map_request_row)
            .transpose()
    }

    async fn insert(&self, request: &Request) -> AppResult<Uuid> {
        sqlx::query(&format!(
            "INSERT INTO requests ({REQUEST_COLUMNS}) VALUES (?,?,?,?,?,?,?)"
        ))
        .bind(request.id.to_string())
        .bind(request.posting_id.to_string())
        .bind(request.requester_id.to_string())
        .bind(request.origin.as_db())
        .bind(request.message.as_deref())
        .bind(request.status.as_db())
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateRequest,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::NotFound,
            other => AppError::Store(other),
        })?;

        Ok(request.id)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        guard: Option<CapacityGuard>,
    ) -> AppResult<bool> {
        // one statement, so the open check, the capacity count and the write commit
        // together
        let result = match guard {
            Some(CapacityGuard { posting_id, role, limit }) => {
                sqlx::query(&format!(
                    "UPDATE requests SET status=?
                     WHERE id=? AND status='pending'
                       AND EXISTS (SELECT 1 FROM postings WHERE id=? AND status='open')
                       AND ({ACCEPTED_FOR_ROLE}) < ?"
                ))
                .bind(status.as_db())
                .bind(id.to_string())
                .bind(posting_id.to_string())
                .bind(posting_id.to_string())
                .bind(role.as_db())
                .bind(i64::from(limit))
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE requests SET status=? WHERE id=? AND status='pending'")
                    .bind(status.as_db())
                    .bind(id.to_string())
                    .execute(&self.pool)
                    .await?
            }
        };

        debug!(request = %id, %status, changed = result.rows_affected(), "request status update");
        Ok(result.rows_affected() == 1)
    }

    async fn list_pending(&self, posting_id: Uuid) -> AppResult<Vec<Request>> {
        sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests
             WHERE posting_id=? AND status='pending'
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(posting_id.to_string())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(map_request_row)
        .collect()
    }

    async fn list_for_requester(&self, requester_id: Uuid) -> AppResult<Vec<Request>> {
        sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests
             WHERE requester_id=?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(requester_id.to_string())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(map_request_row)
        .collect()
    }

    async fn list_incoming(&self, owner_id: Uuid) -> AppResult<Vec<Request>> {
        sqlx::query(&format!(
            "SELECT {JOINED_REQUEST_COLUMNS} FROM requests r
             JOIN postings p ON p.id = r.posting_id
             WHERE p.owner_id=? AND r.status='pending' AND r.origin=?
             ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(owner_id.to_string())
        .bind(RequestOrigin::Join.as_db())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(map_request_row)
        .collect()
    }
}
