//! SQLite store for discussions, events and profiles
//!
//! Scalar fields map to columns; array-valued fields (tags, comments,
//! attendees, followers, social links, programs, ticket info) are stored as
//! JSON text, since every mutation rewrites the owning row anyway.

use rusqlite::{params, Connection, Result as SqliteResult};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Mutex};

use super::models::{
    Discussion, DiscussionStatus, Event, EventStatus, Profile, TicketInfo,
};

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn from_json<T: DeserializeOwned + Default>(text: &str) -> T {
    serde_json::from_str(text).unwrap_or_default()
}

/// Database connection wrapper
pub struct CommunityDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl CommunityDatabase {
    /// Create a new database connection and initialize tables
    pub fn new(path: &str) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_tables()?;
        Ok(db)
    }

    /// Create in-memory database (for testing)
    pub fn in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_tables()?;
        Ok(db)
    }

    fn init_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS discussions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                user_id TEXT NOT NULL,
                tags TEXT NOT NULL,
                comments TEXT NOT NULL,
                upvotes INTEGER NOT NULL DEFAULT 0,
                downvotes INTEGER NOT NULL DEFAULT 0,
                views INTEGER NOT NULL DEFAULT 0,
                pinned INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'open',
                flagged INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                location TEXT NOT NULL,
                is_virtual INTEGER NOT NULL DEFAULT 0,
                virtual_link TEXT,
                date TEXT NOT NULL,
                end_date TEXT,
                organizer_id TEXT NOT NULL,
                attendees TEXT NOT NULL,
                capacity INTEGER NOT NULL DEFAULT 0,
                tickets TEXT NOT NULL,
                category TEXT,
                rsvp_required INTEGER NOT NULL DEFAULT 1,
                is_public INTEGER NOT NULL DEFAULT 1,
                status TEXT NOT NULL DEFAULT 'upcoming',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                profile_picture TEXT,
                bio TEXT,
                date_of_birth TEXT,
                year INTEGER,
                interests TEXT NOT NULL,
                skills TEXT NOT NULL,
                social_links TEXT NOT NULL,
                programs TEXT NOT NULL,
                followers TEXT NOT NULL,
                following TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_discussions_created ON discussions(created_at);
            CREATE INDEX IF NOT EXISTS idx_events_date ON events(date);
            CREATE INDEX IF NOT EXISTS idx_profiles_username ON profiles(username);
            "#,
        )?;

        Ok(())
    }

    // ==================== Discussions ====================

    pub fn create_discussion(&self, d: &Discussion) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO discussions
             (id, title, body, user_id, tags, comments, upvotes, downvotes, views,
              pinned, status, flagged, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                d.id,
                d.title,
                d.body,
                d.user_id,
                to_json(&d.tags),
                to_json(&d.comments),
                d.upvotes,
                d.downvotes,
                d.views,
                d.pinned as i32,
                d.status.as_str(),
                d.flagged as i32,
                d.created_at,
                d.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_discussion(&self, id: &str) -> SqliteResult<Option<Discussion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, body, user_id, tags, comments, upvotes, downvotes,
                    views, pinned, status, flagged, created_at, updated_at
             FROM discussions WHERE id = ?1",
        )?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_discussion(row)?))
        } else {
            Ok(None)
        }
    }

    /// All discussions, newest first; filtering and pagination happen in the
    /// handler since the collection is small.
    pub fn list_discussions(&self) -> SqliteResult<Vec<Discussion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, body, user_id, tags, comments, upvotes, downvotes,
                    views, pinned, status, flagged, created_at, updated_at
             FROM discussions ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], |row| Self::row_to_discussion(row))?;
        rows.collect()
    }

    /// Rewrite the whole row. A single statement, so concurrent readers
    /// never see a half-updated record.
    pub fn update_discussion(&self, d: &Discussion) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE discussions SET
                title = ?2, body = ?3, user_id = ?4, tags = ?5, comments = ?6,
                upvotes = ?7, downvotes = ?8, views = ?9, pinned = ?10,
                status = ?11, flagged = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                d.id,
                d.title,
                d.body,
                d.user_id,
                to_json(&d.tags),
                to_json(&d.comments),
                d.upvotes,
                d.downvotes,
                d.views,
                d.pinned as i32,
                d.status.as_str(),
                d.flagged as i32,
                d.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn delete_discussion(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM discussions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn row_to_discussion(row: &rusqlite::Row) -> SqliteResult<Discussion> {
        let tags: String = row.get(4)?;
        let comments: String = row.get(5)?;
        let status: String = row.get(10)?;
        Ok(Discussion {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            user_id: row.get(3)?,
            tags: from_json(&tags),
            comments: from_json(&comments),
            upvotes: row.get(6)?,
            downvotes: row.get(7)?,
            views: row.get(8)?,
            pinned: row.get::<_, i32>(9)? != 0,
            status: DiscussionStatus::from_str(&status).unwrap_or(DiscussionStatus::Open),
            flagged: row.get::<_, i32>(11)? != 0,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    // ==================== Events ====================

    pub fn create_event(&self, e: &Event) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO events
             (id, title, description, location, is_virtual, virtual_link, date,
              end_date, organizer_id, attendees, capacity, tickets, category,
              rsvp_required, is_public, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18)",
            params![
                e.id,
                e.title,
                e.description,
                e.location,
                e.is_virtual as i32,
                e.virtual_link,
                e.date,
                e.end_date,
                e.organizer_id,
                to_json(&e.attendees),
                e.capacity,
                to_json(&e.tickets),
                e.category,
                e.rsvp_required as i32,
                e.is_public as i32,
                e.status.as_str(),
                e.created_at,
                e.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_event(&self, id: &str) -> SqliteResult<Option<Event>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, location, is_virtual, virtual_link,
                    date, end_date, organizer_id, attendees, capacity, tickets,
                    category, rsvp_required, is_public, status, created_at, updated_at
             FROM events WHERE id = ?1",
        )?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_event(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_events(&self) -> SqliteResult<Vec<Event>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, location, is_virtual, virtual_link,
                    date, end_date, organizer_id, attendees, capacity, tickets,
                    category, rsvp_required, is_public, status, created_at, updated_at
             FROM events ORDER BY date ASC",
        )?;

        let rows = stmt.query_map([], |row| Self::row_to_event(row))?;
        rows.collect()
    }

    pub fn update_event(&self, e: &Event) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE events SET
                title = ?2, description = ?3, location = ?4, is_virtual = ?5,
                virtual_link = ?6, date = ?7, end_date = ?8, organizer_id = ?9,
                attendees = ?10, capacity = ?11, tickets = ?12, category = ?13,
                rsvp_required = ?14, is_public = ?15, status = ?16, updated_at = ?17
             WHERE id = ?1",
            params![
                e.id,
                e.title,
                e.description,
                e.location,
                e.is_virtual as i32,
                e.virtual_link,
                e.date,
                e.end_date,
                e.organizer_id,
                to_json(&e.attendees),
                e.capacity,
                to_json(&e.tickets),
                e.category,
                e.rsvp_required as i32,
                e.is_public as i32,
                e.status.as_str(),
                e.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn delete_event(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn row_to_event(row: &rusqlite::Row) -> SqliteResult<Event> {
        let attendees: String = row.get(9)?;
        let tickets: String = row.get(11)?;
        let status: String = row.get(15)?;
        Ok(Event {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            location: row.get(3)?,
            is_virtual: row.get::<_, i32>(4)? != 0,
            virtual_link: row.get(5)?,
            date: row.get(6)?,
            end_date: row.get(7)?,
            organizer_id: row.get(8)?,
            attendees: from_json(&attendees),
            capacity: row.get(10)?,
            tickets: from_json::<Option<TicketInfo>>(&tickets).unwrap_or_default(),
            category: row.get(12)?,
            rsvp_required: row.get::<_, i32>(13)? != 0,
            is_public: row.get::<_, i32>(14)? != 0,
            status: EventStatus::from_str(&status).unwrap_or(EventStatus::Upcoming),
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    // ==================== Profiles ====================

    pub fn create_profile(&self, p: &Profile) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO profiles
             (user_id, username, email, phone, profile_picture, bio, date_of_birth,
              year, interests, skills, social_links, programs, followers, following,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16)",
            params![
                p.user_id,
                p.username,
                p.email,
                p.phone,
                p.profile_picture,
                p.bio,
                p.date_of_birth,
                p.year,
                to_json(&p.interests),
                to_json(&p.skills),
                to_json(&p.social_links),
                to_json(&p.programs),
                to_json(&p.followers),
                to_json(&p.following),
                p.created_at,
                p.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_profile(&self, user_id: &str) -> SqliteResult<Option<Profile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, username, email, phone, profile_picture, bio,
                    date_of_birth, year, interests, skills, social_links, programs,
                    followers, following, created_at, updated_at
             FROM profiles WHERE user_id = ?1",
        )?;

        let mut rows = stmt.query(params![user_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_profile(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_profiles(&self) -> SqliteResult<Vec<Profile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, username, email, phone, profile_picture, bio,
                    date_of_birth, year, interests, skills, social_links, programs,
                    followers, following, created_at, updated_at
             FROM profiles ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], |row| Self::row_to_profile(row))?;
        rows.collect()
    }

    pub fn update_profile(&self, p: &Profile) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE profiles SET
                username = ?2, email = ?3, phone = ?4, profile_picture = ?5,
                bio = ?6, date_of_birth = ?7, year = ?8, interests = ?9,
                skills = ?10, social_links = ?11, programs = ?12, followers = ?13,
                following = ?14, updated_at = ?15
             WHERE user_id = ?1",
            params![
                p.user_id,
                p.username,
                p.email,
                p.phone,
                p.profile_picture,
                p.bio,
                p.date_of_birth,
                p.year,
                to_json(&p.interests),
                to_json(&p.skills),
                to_json(&p.social_links),
                to_json(&p.programs),
                to_json(&p.followers),
                to_json(&p.following),
                p.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn delete_profile(&self, user_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM profiles WHERE user_id = ?1", params![user_id])?;
        Ok(deleted > 0)
    }

    fn row_to_profile(row: &rusqlite::Row) -> SqliteResult<Profile> {
        let interests: String = row.get(8)?;
        let skills: String = row.get(9)?;
        let social_links: String = row.get(10)?;
        let programs: String = row.get(11)?;
        let followers: String = row.get(12)?;
        let following: String = row.get(13)?;
        Ok(Profile {
            user_id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            profile_picture: row.get(4)?,
            bio: row.get(5)?,
            date_of_birth: row.get(6)?,
            year: row.get(7)?,
            interests: from_json(&interests),
            skills: from_json(&skills),
            social_links: from_json(&social_links),
            programs: from_json(&programs),
            followers: from_json(&followers),
            following: from_json(&following),
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

impl Clone for CommunityDatabase {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::models::Comment;

    fn sample_discussion(id: &str) -> Discussion {
        let now = chrono::Utc::now().to_rfc3339();
        Discussion {
            id: id.to_string(),
            title: "Study group".to_string(),
            body: "Anyone up for Tuesday?".to_string(),
            user_id: "user_1".to_string(),
            tags: vec!["study".to_string()],
            comments: vec![],
            upvotes: 0,
            downvotes: 0,
            views: 0,
            pinned: false,
            status: DiscussionStatus::Open,
            flagged: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_discussion_roundtrip_with_comments() {
        let db = CommunityDatabase::in_memory().unwrap();
        let mut discussion = sample_discussion("d1");
        discussion.comments.push(Comment {
            id: "c1".to_string(),
            body: "count me in".to_string(),
            user_id: "user_2".to_string(),
            upvotes: 3,
            downvotes: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        db.create_discussion(&discussion).unwrap();

        let found = db.find_discussion("d1").unwrap().unwrap();
        assert_eq!(found.title, "Study group");
        assert_eq!(found.tags, vec!["study".to_string()]);
        assert_eq!(found.comments.len(), 1);
        assert_eq!(found.comments[0].upvotes, 3);
        assert_eq!(found.status, DiscussionStatus::Open);
    }

    #[test]
    fn test_discussion_update_and_delete() {
        let db = CommunityDatabase::in_memory().unwrap();
        db.create_discussion(&sample_discussion("d1")).unwrap();

        let mut discussion = db.find_discussion("d1").unwrap().unwrap();
        discussion.pinned = true;
        discussion.upvotes = 5;
        discussion.status = DiscussionStatus::Closed;
        db.update_discussion(&discussion).unwrap();

        let found = db.find_discussion("d1").unwrap().unwrap();
        assert!(found.pinned);
        assert_eq!(found.upvotes, 5);
        assert_eq!(found.status, DiscussionStatus::Closed);

        assert!(db.delete_discussion("d1").unwrap());
        assert!(!db.delete_discussion("d1").unwrap());
        assert!(db.find_discussion("d1").unwrap().is_none());
    }

    #[test]
    fn test_event_roundtrip() {
        let db = CommunityDatabase::in_memory().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        let event = Event {
            id: "e1".to_string(),
            title: "Hack night".to_string(),
            description: "Bring a laptop".to_string(),
            location: "Lawson B151".to_string(),
            is_virtual: false,
            virtual_link: None,
            date: "2026-09-01T18:00:00Z".to_string(),
            end_date: None,
            organizer_id: "user_1".to_string(),
            attendees: vec!["user_2".to_string()],
            capacity: 40,
            tickets: TicketInfo {
                available: 40,
                price: 0.0,
                currency: "USD".to_string(),
            },
            category: Some("tech".to_string()),
            rsvp_required: true,
            is_public: true,
            status: EventStatus::Upcoming,
            created_at: now.clone(),
            updated_at: now,
        };
        db.create_event(&event).unwrap();

        let found = db.find_event("e1").unwrap().unwrap();
        assert_eq!(found.attendees, vec!["user_2".to_string()]);
        assert_eq!(found.tickets.available, 40);
        assert_eq!(found.tickets.currency, "USD");
        assert_eq!(found.status, EventStatus::Upcoming);
        assert!(db.delete_event("e1").unwrap());
    }

    #[test]
    fn test_profile_roundtrip() {
        let db = CommunityDatabase::in_memory().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        let profile = Profile {
            user_id: "user_1".to_string(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            phone: None,
            profile_picture: None,
            bio: Some("CS senior".to_string()),
            date_of_birth: None,
            year: Some(4),
            interests: vec!["rust".to_string()],
            skills: vec![],
            social_links: vec![],
            programs: vec![],
            followers: vec![],
            following: vec!["user_2".to_string()],
            created_at: now.clone(),
            updated_at: now,
        };
        db.create_profile(&profile).unwrap();

        let found = db.find_profile("user_1").unwrap().unwrap();
        assert_eq!(found.username, "jdoe");
        assert_eq!(found.following, vec!["user_2".to_string()]);
        assert_eq!(found.year, Some(4));

        assert_eq!(db.list_profiles().unwrap().len(), 1);
        assert!(db.delete_profile("user_1").unwrap());
        assert!(db.find_profile("user_1").unwrap().is_none());
    }
}
