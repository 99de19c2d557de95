//! Account and credential management
//!
//! - User registration with email/password
//! - JWT token-based sessions
//! - Email-verified password change flow

pub mod codes;
pub mod database;
pub mod email;
pub mod jwt;
pub mod models;
pub mod password;
pub mod routes;

pub use codes::{CodeStore, InMemoryCodeStore};
pub use database::AuthDatabase;
pub use jwt::{JwtConfig, JwtManager};
pub use models::*;
pub use routes::{auth_router, user_router, AuthState};
