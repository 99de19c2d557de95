//! Community data models

use serde::{Deserialize, Serialize};

/// A comment embedded in a discussion thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub user_id: String,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscussionStatus {
    Open,
    Closed,
}

impl DiscussionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscussionStatus::Open => "open",
            DiscussionStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(DiscussionStatus::Open),
            "closed" => Some(DiscussionStatus::Closed),
            _ => None,
        }
    }
}

/// A discussion thread
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: String,
    pub title: String,
    pub body: String,
    pub user_id: String,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub views: i64,
    pub pinned: bool,
    pub status: DiscussionStatus,
    pub flagged: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(EventStatus::Upcoming),
            "ongoing" => Some(EventStatus::Ongoing),
            "completed" => Some(EventStatus::Completed),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }
}

/// Ticketing metadata attached to an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketInfo {
    #[serde(default)]
    pub available: i64,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for TicketInfo {
    fn default() -> Self {
        Self {
            available: 0,
            price: 0.0,
            currency: default_currency(),
        }
    }
}

/// A community event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub is_virtual: bool,
    pub virtual_link: Option<String>,
    pub date: String,
    pub end_date: Option<String>,
    pub organizer_id: String,
    pub attendees: Vec<String>,
    pub capacity: i64,
    pub tickets: TicketInfo,
    pub category: Option<String>,
    pub rsvp_required: bool,
    pub is_public: bool,
    pub status: EventStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// A link to an external profile (platform name + URL)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    pub id: String,
    pub platform: String,
    pub url: String,
}

/// A program affiliation (degree program, club, cohort)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub program_name: String,
    pub program_type: Option<String>,
    pub major: Option<String>,
}

/// A user profile, keyed by the owning user's id
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub year: Option<i64>,
    pub interests: Vec<String>,
    pub skills: Vec<String>,
    pub social_links: Vec<SocialLink>,
    pub programs: Vec<Program>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}
