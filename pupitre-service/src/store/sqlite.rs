//! SQLite-based storage backend

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use pupitre_core::{
    Card, CardId, CardStatus, Comment, CommentId, DeckId, FlashcardDeck, GrantDuration, Owner,
    PremiumGrant, Resource, ResourceId, UserId, UserProfile,
};

use super::{
    DeckStore, EngagementStore, EntitlementStore, LeaderboardStore, LikeOutcome, ProfileStore,
    StoreResult,
};
use crate::error::ServiceError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based store implementing every store trait
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let conn = Connection::open(path).map_err(|e| ServiceError::Store(e.to_string()))?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ServiceError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ServiceError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(|e| ServiceError::Store(e.to_string()))
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ServiceError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- User profiles; set-valued fields stored as JSON arrays
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                display_name TEXT NOT NULL,
                school TEXT,
                class_name TEXT,
                series TEXT,
                contact TEXT,
                points INTEGER NOT NULL DEFAULT 0,
                saved_courses TEXT NOT NULL,
                saved_resources TEXT NOT NULL,
                requests_sent TEXT NOT NULL,
                requests_received TEXT NOT NULL,
                read_notifications TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Premium grants, one row per user
            CREATE TABLE IF NOT EXISTS premium_grants (
                user_id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                duration TEXT NOT NULL
            );

            -- Flashcard decks; cards stored as a JSON list
            CREATE TABLE IF NOT EXISTS decks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                subject TEXT NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 0,
                classes TEXT NOT NULL,
                series TEXT NOT NULL,
                cards TEXT NOT NULL,
                owner_kind TEXT NOT NULL,
                owner_id TEXT,
                created_at TEXT NOT NULL
            );

            -- Card progress keyed by (user, deck, card). Deck deletion
            -- fans out explicitly, so no foreign key here.
            CREATE TABLE IF NOT EXISTS card_progress (
                user_id TEXT NOT NULL,
                deck_id TEXT NOT NULL,
                card_id TEXT NOT NULL,
                status TEXT NOT NULL,
                PRIMARY KEY (user_id, deck_id, card_id)
            );
            CREATE INDEX IF NOT EXISTS idx_progress_deck ON card_progress(deck_id);

            -- Shared resources with denormalized engagement counters
            CREATE TABLE IF NOT EXISTS resources (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                subject TEXT,
                is_public INTEGER NOT NULL DEFAULT 1,
                classes TEXT NOT NULL,
                series TEXT NOT NULL,
                owner_kind TEXT NOT NULL,
                owner_id TEXT,
                like_count INTEGER NOT NULL DEFAULT 0,
                comment_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Like set membership
            CREATE TABLE IF NOT EXISTS resource_likes (
                resource_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                PRIMARY KEY (resource_id, user_id)
            );

            -- Comment sub-collection
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                resource_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_comments_resource ON comments(resource_id);

            -- Users hidden from public ranking
            CREATE TABLE IF NOT EXISTS leaderboard_exclusions (
                user_id TEXT PRIMARY KEY
            );
            "#,
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(())
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn owner_columns(owner: &Owner) -> (&'static str, Option<&str>) {
    match owner {
        Owner::User(u) => ("user", Some(u.0.as_str())),
        Owner::System => ("system", None),
    }
}

fn owner_from_columns(kind: &str, id: Option<String>) -> Owner {
    match (kind, id) {
        ("user", Some(id)) => Owner::User(UserId(id)),
        _ => Owner::System,
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let id: String = row.get(0)?;
    let version: i64 = row.get(1)?;
    let display_name: String = row.get(2)?;
    let school: Option<String> = row.get(3)?;
    let class_name: Option<String> = row.get(4)?;
    let series: Option<String> = row.get(5)?;
    let contact: Option<String> = row.get(6)?;
    let points: i64 = row.get(7)?;
    let saved_courses: String = row.get(8)?;
    let saved_resources: String = row.get(9)?;
    let requests_sent: String = row.get(10)?;
    let requests_received: String = row.get(11)?;
    let read_notifications: String = row.get(12)?;
    let created_at: String = row.get(13)?;
    Ok(UserProfile {
        version: version as u32,
        id: UserId(id),
        display_name,
        school,
        class_name,
        series,
        contact,
        points: points as u64,
        saved_courses: serde_json::from_str(&saved_courses).unwrap_or_default(),
        saved_resources: serde_json::from_str(&saved_resources).unwrap_or_default(),
        requests_sent: serde_json::from_str(&requests_sent).unwrap_or_default(),
        requests_received: serde_json::from_str(&requests_received).unwrap_or_default(),
        read_admin_notifications: serde_json::from_str(&read_notifications).unwrap_or_default(),
        created_at: parse_ts(&created_at),
    })
}

const PROFILE_COLUMNS: &str = "id, version, display_name, school, class_name, series, contact, \
     points, saved_courses, saved_resources, requests_sent, requests_received, \
     read_notifications, created_at";

fn grant_from_row(row: &Row<'_>) -> rusqlite::Result<PremiumGrant> {
    let user_id: String = row.get(0)?;
    let started_at: String = row.get(1)?;
    let expires_at: String = row.get(2)?;
    let duration: String = row.get(3)?;
    Ok(PremiumGrant {
        user_id: UserId(user_id),
        started_at: parse_ts(&started_at),
        expires_at: parse_ts(&expires_at),
        duration: GrantDuration::from_str(&duration).unwrap_or(GrantDuration::Week),
    })
}

fn deck_from_row(row: &Row<'_>) -> rusqlite::Result<FlashcardDeck> {
    let id: String = row.get(0)?;
    let title: String = row.get(1)?;
    let subject: String = row.get(2)?;
    let is_public: i32 = row.get(3)?;
    let classes: String = row.get(4)?;
    let series: String = row.get(5)?;
    let cards: String = row.get(6)?;
    let owner_kind: String = row.get(7)?;
    let owner_id: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;
    Ok(FlashcardDeck {
        id: DeckId(id),
        title,
        subject,
        is_public: is_public != 0,
        classes: serde_json::from_str(&classes).unwrap_or_default(),
        series: serde_json::from_str(&series).unwrap_or_default(),
        cards: serde_json::from_str::<Vec<Card>>(&cards).unwrap_or_default(),
        owner: owner_from_columns(&owner_kind, owner_id),
        created_at: parse_ts(&created_at),
    })
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    let id: String = row.get(0)?;
    let title: String = row.get(1)?;
    let subject: Option<String> = row.get(2)?;
    let is_public: i32 = row.get(3)?;
    let classes: String = row.get(4)?;
    let series: String = row.get(5)?;
    let owner_kind: String = row.get(6)?;
    let owner_id: Option<String> = row.get(7)?;
    let like_count: i64 = row.get(8)?;
    let comment_count: i64 = row.get(9)?;
    let created_at: String = row.get(10)?;
    Ok(Resource {
        id: ResourceId(id),
        title,
        subject,
        is_public: is_public != 0,
        classes: serde_json::from_str(&classes).unwrap_or_default(),
        series: serde_json::from_str(&series).unwrap_or_default(),
        owner: owner_from_columns(&owner_kind, owner_id),
        like_count: like_count as u64,
        comment_count: comment_count as u64,
        created_at: parse_ts(&created_at),
    })
}

fn json_encode<T: serde::Serialize>(value: &T) -> Result<String, ServiceError> {
    serde_json::to_string(value).map_err(|e| ServiceError::Store(e.to_string()))
}

impl EntitlementStore for SqliteStore {
    fn put_grant(&self, grant: PremiumGrant) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR REPLACE INTO premium_grants (user_id, started_at, expires_at, duration)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                grant.user_id.0,
                grant.started_at.to_rfc3339(),
                grant.expires_at.to_rfc3339(),
                grant.duration.as_str(),
            ],
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(())
    }

    fn get_grant(&self, user: &UserId) -> StoreResult<Option<PremiumGrant>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT user_id, started_at, expires_at, duration FROM premium_grants WHERE user_id = ?1",
            params![user.0],
            grant_from_row,
        )
        .optional()
        .map_err(|e| ServiceError::Store(e.to_string()))
    }

    fn delete_grant(&self, user: &UserId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM premium_grants WHERE user_id = ?1",
            params![user.0],
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(())
    }

    fn get_grants(&self, users: &[UserId]) -> StoreResult<HashMap<UserId, PremiumGrant>> {
        if users.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; users.len()].join(", ");
        let sql = format!(
            "SELECT user_id, started_at, expires_at, duration FROM premium_grants \
             WHERE user_id IN ({placeholders})"
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let grants = stmt
            .query_map(
                params_from_iter(users.iter().map(|u| u.0.as_str())),
                grant_from_row,
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(grants
            .into_iter()
            .map(|g| (g.user_id.clone(), g))
            .collect())
    }
}

impl ProfileStore for SqliteStore {
    fn create_profile(&self, profile: UserProfile) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO users (id, version, display_name, school, class_name, series, contact, \
             points, saved_courses, saved_resources, requests_sent, requests_received, \
             read_notifications, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                profile.id.0,
                profile.version,
                profile.display_name,
                profile.school,
                profile.class_name,
                profile.series,
                profile.contact,
                profile.points as i64,
                json_encode(&profile.saved_courses)?,
                json_encode(&profile.saved_resources)?,
                json_encode(&profile.requests_sent)?,
                json_encode(&profile.requests_received)?,
                json_encode(&profile.read_admin_notifications)?,
                profile.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return ServiceError::UserExists;
                }
            }
            ServiceError::Store(e.to_string())
        })?;

        Ok(())
    }

    fn get_profile(&self, user: &UserId) -> StoreResult<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?1"),
            params![user.0],
            profile_from_row,
        )
        .optional()
        .map_err(|e| ServiceError::Store(e.to_string()))
    }

    fn update_profile(&self, profile: UserProfile) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // Points and created_at are deliberately not part of this update.
        let rows_affected = conn
            .execute(
                "UPDATE users SET version = ?1, display_name = ?2, school = ?3, class_name = ?4, \
                 series = ?5, contact = ?6, saved_courses = ?7, saved_resources = ?8, \
                 requests_sent = ?9, requests_received = ?10, read_notifications = ?11 \
                 WHERE id = ?12",
                params![
                    profile.version,
                    profile.display_name,
                    profile.school,
                    profile.class_name,
                    profile.series,
                    profile.contact,
                    json_encode(&profile.saved_courses)?,
                    json_encode(&profile.saved_resources)?,
                    json_encode(&profile.requests_sent)?,
                    json_encode(&profile.requests_received)?,
                    json_encode(&profile.read_admin_notifications)?,
                    profile.id.0,
                ],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        if rows_affected == 0 {
            return Err(ServiceError::UserNotFound);
        }

        Ok(())
    }

    fn add_points(&self, user: &UserId, delta: u64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // Single-statement increment; the adjustment happens in the store.
        let rows_affected = conn
            .execute(
                "UPDATE users SET points = points + ?1 WHERE id = ?2",
                params![delta as i64, user.0],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        if rows_affected == 0 {
            return Err(ServiceError::UserNotFound);
        }

        Ok(())
    }

    fn top_profiles(&self, limit: usize) -> StoreResult<Vec<UserProfile>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM users ORDER BY points DESC, id ASC LIMIT ?1"
            ))
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let profiles = stmt
            .query_map(params![limit as i64], profile_from_row)
            .map_err(|e| ServiceError::Store(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(profiles)
    }
}

impl DeckStore for SqliteStore {
    fn put_deck(&self, deck: FlashcardDeck) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let (owner_kind, owner_id) = owner_columns(&deck.owner);

        conn.execute(
            "INSERT OR REPLACE INTO decks (id, title, subject, is_public, classes, series, \
             cards, owner_kind, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                deck.id.0,
                deck.title,
                deck.subject,
                deck.is_public as i32,
                json_encode(&deck.classes)?,
                json_encode(&deck.series)?,
                json_encode(&deck.cards)?,
                owner_kind,
                owner_id,
                deck.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(())
    }

    fn get_deck(&self, deck: &DeckId) -> StoreResult<Option<FlashcardDeck>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT id, title, subject, is_public, classes, series, cards, owner_kind, \
             owner_id, created_at FROM decks WHERE id = ?1",
            params![deck.0],
            deck_from_row,
        )
        .optional()
        .map_err(|e| ServiceError::Store(e.to_string()))
    }

    fn list_decks(&self) -> StoreResult<Vec<FlashcardDeck>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, title, subject, is_public, classes, series, cards, owner_kind, \
                 owner_id, created_at FROM decks",
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let decks = stmt
            .query_map([], deck_from_row)
            .map_err(|e| ServiceError::Store(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(decks)
    }

    fn delete_deck(&self, deck: &DeckId) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        // Explicit fan-out: the deck and all progress rows referencing it
        // go in the same transaction.
        tx.execute(
            "DELETE FROM card_progress WHERE deck_id = ?1",
            params![deck.0],
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        tx.execute("DELETE FROM decks WHERE id = ?1", params![deck.0])
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        tx.commit().map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(())
    }

    fn get_progress(
        &self,
        user: &UserId,
        deck: &DeckId,
    ) -> StoreResult<HashMap<CardId, CardStatus>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT card_id, status FROM card_progress WHERE user_id = ?1 AND deck_id = ?2")
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let entries = stmt
            .query_map(params![user.0, deck.0], |row| {
                let card_id: String = row.get(0)?;
                let status: String = row.get(1)?;
                Ok((card_id, status))
            })
            .map_err(|e| ServiceError::Store(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(entries
            .into_iter()
            .filter_map(|(card_id, status)| {
                CardStatus::from_str(&status).map(|s| (CardId(card_id), s))
            })
            .collect())
    }

    fn set_card_status(
        &self,
        user: &UserId,
        deck: &DeckId,
        card: &CardId,
        status: CardStatus,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // One row per card, so the upsert never touches siblings.
        conn.execute(
            "INSERT OR REPLACE INTO card_progress (user_id, deck_id, card_id, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![user.0, deck.0, card.0, status.as_str()],
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(())
    }
}

impl EngagementStore for SqliteStore {
    fn put_resource(&self, resource: Resource) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let (owner_kind, owner_id) = owner_columns(&resource.owner);

        conn.execute(
            "INSERT OR REPLACE INTO resources (id, title, subject, is_public, classes, series, \
             owner_kind, owner_id, like_count, comment_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                resource.id.0,
                resource.title,
                resource.subject,
                resource.is_public as i32,
                json_encode(&resource.classes)?,
                json_encode(&resource.series)?,
                owner_kind,
                owner_id,
                resource.like_count as i64,
                resource.comment_count as i64,
                resource.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(())
    }

    fn get_resource(&self, resource: &ResourceId) -> StoreResult<Option<Resource>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT id, title, subject, is_public, classes, series, owner_kind, owner_id, \
             like_count, comment_count, created_at FROM resources WHERE id = ?1",
            params![resource.0],
            resource_from_row,
        )
        .optional()
        .map_err(|e| ServiceError::Store(e.to_string()))
    }

    fn toggle_like(&self, user: &UserId, resource: &ResourceId) -> StoreResult<LikeOutcome> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM resources WHERE id = ?1)",
                params![resource.0],
                |row| row.get(0),
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
        if !exists {
            return Err(ServiceError::ResourceNotFound);
        }

        let member: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM resource_likes WHERE resource_id = ?1 AND user_id = ?2)",
                params![resource.0, user.0],
                |row| row.get(0),
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let liked = if member {
            tx.execute(
                "DELETE FROM resource_likes WHERE resource_id = ?1 AND user_id = ?2",
                params![resource.0, user.0],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
            tx.execute(
                "UPDATE resources SET like_count = like_count - 1 WHERE id = ?1",
                params![resource.0],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
            false
        } else {
            tx.execute(
                "INSERT INTO resource_likes (resource_id, user_id) VALUES (?1, ?2)",
                params![resource.0, user.0],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
            tx.execute(
                "UPDATE resources SET like_count = like_count + 1 WHERE id = ?1",
                params![resource.0],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
            true
        };

        tx.commit().map_err(|e| ServiceError::Store(e.to_string()))?;

        // Post-commit re-read, per the toggle contract.
        let like_count: i64 = conn
            .query_row(
                "SELECT like_count FROM resources WHERE id = ?1",
                params![resource.0],
                |row| row.get(0),
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(LikeOutcome {
            liked,
            like_count: like_count as u64,
        })
    }

    fn add_comment(&self, comment: Comment) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM resources WHERE id = ?1)",
                params![comment.resource_id.0],
                |row| row.get(0),
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
        if !exists {
            return Err(ServiceError::ResourceNotFound);
        }

        conn.execute(
            "INSERT INTO comments (id, resource_id, user_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id.0,
                comment.resource_id.0,
                comment.author.0,
                comment.body,
                comment.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ServiceError::Store(e.to_string()))?;

        // Second write on purpose: append and counter bump are the
        // documented two-write pair. A failure here leaves the counter
        // lagging by one and surfaces as CommentCountLag.
        conn.execute(
            "UPDATE resources SET comment_count = comment_count + 1 WHERE id = ?1",
            params![comment.resource_id.0],
        )
        .map_err(|e| ServiceError::CommentCountLag(e.to_string()))?;

        Ok(())
    }

    fn list_comments(&self, resource: &ResourceId) -> StoreResult<Vec<Comment>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, resource_id, user_id, body, created_at FROM comments \
                 WHERE resource_id = ?1 ORDER BY created_at ASC, id ASC",
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let comments = stmt
            .query_map(params![resource.0], |row| {
                let id: String = row.get(0)?;
                let resource_id: String = row.get(1)?;
                let author: String = row.get(2)?;
                let body: String = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok(Comment {
                    id: CommentId(id),
                    resource_id: ResourceId(resource_id),
                    author: UserId(author),
                    body,
                    created_at: parse_ts(&created_at),
                })
            })
            .map_err(|e| ServiceError::Store(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(comments)
    }
}

impl LeaderboardStore for SqliteStore {
    fn set_excluded(&self, user: &UserId, excluded: bool) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        if excluded {
            conn.execute(
                "INSERT OR IGNORE INTO leaderboard_exclusions (user_id) VALUES (?1)",
                params![user.0],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
        } else {
            conn.execute(
                "DELETE FROM leaderboard_exclusions WHERE user_id = ?1",
                params![user.0],
            )
            .map_err(|e| ServiceError::Store(e.to_string()))?;
        }

        Ok(())
    }

    fn is_excluded(&self, user: &UserId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM leaderboard_exclusions WHERE user_id = ?1)",
            params![user.0],
            |row| row.get(0),
        )
        .map_err(|e| ServiceError::Store(e.to_string()))
    }

    fn excluded_users(&self) -> StoreResult<BTreeSet<UserId>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT user_id FROM leaderboard_exclusions")
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        let users = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                Ok(UserId(id))
            })
            .map_err(|e| ServiceError::Store(e.to_string()))?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| ServiceError::Store(e.to_string()))?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pupitre_core::{GrantDuration, Owner};
    use tempfile::TempDir;

    use super::*;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::open(&path).unwrap();
        (store, dir) // Return dir to keep it alive
    }

    #[test]
    fn test_profile_roundtrip() {
        let (store, _dir) = create_test_store();

        let mut profile = UserProfile::new(UserId("u1".into()), "Awa", Utc::now());
        profile.class_name = Some("Terminale".into());
        profile.saved_resources.insert(ResourceId("r1".into()));
        store.create_profile(profile.clone()).unwrap();

        let loaded = store.get_profile(&UserId("u1".into())).unwrap().unwrap();
        assert_eq!(loaded.display_name, "Awa");
        assert_eq!(loaded.class_name.as_deref(), Some("Terminale"));
        assert!(loaded.saved_resources.contains(&ResourceId("r1".into())));
    }

    #[test]
    fn test_duplicate_profile_rejected() {
        let (store, _dir) = create_test_store();

        let profile = UserProfile::new(UserId("u1".into()), "Awa", Utc::now());
        store.create_profile(profile.clone()).unwrap();

        let result = store.create_profile(profile);
        assert!(matches!(result, Err(ServiceError::UserExists)));
    }

    #[test]
    fn test_update_preserves_points() {
        let (store, _dir) = create_test_store();

        let profile = UserProfile::new(UserId("u1".into()), "Awa", Utc::now());
        store.create_profile(profile.clone()).unwrap();
        store.add_points(&UserId("u1".into()), 7).unwrap();

        // A stale caller copy still carries points = 0.
        let mut stale = profile;
        stale.school = Some("Lycée Blaise Diagne".into());
        store.update_profile(stale).unwrap();

        let loaded = store.get_profile(&UserId("u1".into())).unwrap().unwrap();
        assert_eq!(loaded.points, 7);
        assert_eq!(loaded.school.as_deref(), Some("Lycée Blaise Diagne"));
    }

    #[test]
    fn test_add_points_unknown_user() {
        let (store, _dir) = create_test_store();

        let result = store.add_points(&UserId("ghost".into()), 1);
        assert!(matches!(result, Err(ServiceError::UserNotFound)));
    }

    #[test]
    fn test_grant_roundtrip_and_batch() {
        let (store, _dir) = create_test_store();
        let u1 = UserId("u1".into());
        let u2 = UserId("u2".into());

        let grant = PremiumGrant::starting_at(u1.clone(), GrantDuration::Month, Utc::now());
        store.put_grant(grant.clone()).unwrap();

        let loaded = store.get_grant(&u1).unwrap().unwrap();
        assert_eq!(loaded.duration, GrantDuration::Month);
        assert_eq!(loaded.user_id, u1);

        let grants = store.get_grants(&[u1.clone(), u2.clone()]).unwrap();
        assert_eq!(grants.len(), 1);
        assert!(grants.contains_key(&u1));
        assert!(!grants.contains_key(&u2));
    }

    #[test]
    fn test_deck_roundtrip_and_cascade() {
        let (store, _dir) = create_test_store();
        let user = UserId("u1".into());
        let deck = FlashcardDeck {
            id: DeckId("d1".into()),
            title: "Verbes irréguliers".into(),
            subject: "anglais".into(),
            is_public: true,
            classes: ["Seconde".to_string()].into(),
            series: BTreeSet::new(),
            cards: vec![Card {
                id: CardId("c1".into()),
                question: "to go".into(),
                answer: "went / gone".into(),
            }],
            owner: Owner::System,
            created_at: Utc::now(),
        };
        store.put_deck(deck.clone()).unwrap();

        let loaded = store.get_deck(&DeckId("d1".into())).unwrap().unwrap();
        assert_eq!(loaded, deck);

        store
            .set_card_status(&user, &deck.id, &CardId("c1".into()), CardStatus::Mastered)
            .unwrap();
        assert_eq!(store.get_progress(&user, &deck.id).unwrap().len(), 1);

        store.delete_deck(&deck.id).unwrap();
        assert!(store.get_deck(&deck.id).unwrap().is_none());
        assert!(store.get_progress(&user, &deck.id).unwrap().is_empty());
    }

    #[test]
    fn test_toggle_like_transactional_pair() {
        let (store, _dir) = create_test_store();
        let id = ResourceId("r1".into());
        store
            .put_resource(Resource::new(id.clone(), "Annales BAC", Owner::System, Utc::now()))
            .unwrap();

        let a = store.toggle_like(&UserId("a".into()), &id).unwrap();
        assert_eq!(a, LikeOutcome { liked: true, like_count: 1 });

        let b = store.toggle_like(&UserId("b".into()), &id).unwrap();
        assert_eq!(b, LikeOutcome { liked: true, like_count: 2 });

        let a = store.toggle_like(&UserId("a".into()), &id).unwrap();
        assert_eq!(a, LikeOutcome { liked: false, like_count: 1 });

        let loaded = store.get_resource(&id).unwrap().unwrap();
        assert_eq!(loaded.like_count, 1);
    }

    #[test]
    fn test_comment_bumps_counter() {
        let (store, _dir) = create_test_store();
        let id = ResourceId("r1".into());
        store
            .put_resource(Resource::new(id.clone(), "Annales BAC", Owner::System, Utc::now()))
            .unwrap();

        let comment = Comment {
            id: CommentId("k1".into()),
            resource_id: id.clone(),
            author: UserId("a".into()),
            body: "Très utile, merci".into(),
            created_at: Utc::now(),
        };
        store.add_comment(comment).unwrap();

        assert_eq!(store.list_comments(&id).unwrap().len(), 1);
        assert_eq!(store.get_resource(&id).unwrap().unwrap().comment_count, 1);
    }

    #[test]
    fn test_exclusions() {
        let (store, _dir) = create_test_store();
        let user = UserId("u1".into());

        store.set_excluded(&user, false).unwrap();
        assert!(!store.is_excluded(&user).unwrap());

        store.set_excluded(&user, true).unwrap();
        store.set_excluded(&user, true).unwrap();
        assert!(store.is_excluded(&user).unwrap());
        assert_eq!(store.excluded_users().unwrap().len(), 1);

        store.set_excluded(&user, false).unwrap();
        assert!(!store.is_excluded(&user).unwrap());
    }
}
