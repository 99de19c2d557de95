//! Community resources: discussions, events and user profiles
//!
//! Straightforward persistence-backed CRUD plus the domain actions
//! (comments, votes, pin/flag, RSVP, follow graph).

pub mod database;
pub mod discussions;
pub mod events;
pub mod models;
pub mod profiles;

pub use database::CommunityDatabase;
pub use discussions::discussions_router;
pub use events::events_router;
pub use models::*;
pub use profiles::profiles_router;

/// Shared state for the community routers
pub struct CommunityState {
    pub db: CommunityDatabase,
}

impl CommunityState {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            db: CommunityDatabase::new(db_path)?,
        })
    }
}
