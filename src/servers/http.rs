//! REST API server

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{auth_router, user_router, AuthState};
use crate::community::{discussions_router, events_router, profiles_router, CommunityState};

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}

pub struct ApiServer {
    config: ApiConfig,
    auth: Arc<AuthState>,
    community: Arc<CommunityState>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, auth: Arc<AuthState>, community: Arc<CommunityState>) -> Self {
        Self {
            config,
            auth,
            community,
        }
    }

    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.create_router();
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        log::info!(
            "🌐 API server listening on http://localhost:{}",
            self.config.port
        );

        axum::serve(listener, app).await?;
        Ok(())
    }

    fn create_router(&self) -> Router {
        Router::new()
            .nest("/api/auth", auth_router(self.auth.clone()))
            .nest("/api/user", user_router(self.auth.clone()))
            .nest("/api/discussions", discussions_router(self.community.clone()))
            .nest("/api/events", events_router(self.community.clone()))
            .nest("/api/profile", profiles_router(self.community.clone()))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{InMemoryCodeStore, JwtConfig, JwtManager};
    use crate::auth::database::AuthDatabase;
    use crate::auth::email::EmailSender;
    use crate::community::CommunityDatabase;

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_router_assembles() {
        let auth = Arc::new(AuthState {
            db: AuthDatabase::in_memory().unwrap(),
            jwt: JwtManager::new(JwtConfig::new("test-secret".to_string(), 24)),
            email: EmailSender::mock(),
            codes: Arc::new(InMemoryCodeStore::new()),
        });
        let community = Arc::new(CommunityState {
            db: CommunityDatabase::in_memory().unwrap(),
        });

        let server = ApiServer::new(ApiConfig::default(), auth, community);
        let _router = server.create_router();
    }
}
