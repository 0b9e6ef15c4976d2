//! Application state management.
//!
//! Defines the AppState struct that holds all shared application state:
//! configuration, the storage backend, the JWT service, the login rate
//! limiter and the services built on top of storage.

use crate::config::AppConfig;
use crate::middleware::rate_limit::{RateLimiterState, create_rate_limiter_with_quota};
use crate::services::question_service::QuestionService;
use crate::services::{
    AuthService, FormService, JwtService, ResponseService, RoleService, ServiceResult,
    SharedJwtService,
};
use crate::storage::{MemoryStorageBackend, PostgresStorageBackend, StorageBackend, StorageError};
use axum::extract::FromRef;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageBackend>,
    pub jwt: SharedJwtService,
    pub login_limiter: RateLimiterState,
    pub forms: FormService,
    pub questions: QuestionService,
    pub responses: ResponseService,
    pub auth: AuthService,
    pub roles: RoleService,
}

impl AppState {
    /// Create the state over an already initialised storage backend.
    pub fn new(config: Arc<AppConfig>, storage: Arc<dyn StorageBackend>) -> Self {
        let forms = FormService::new(storage.clone());
        let auth = AuthService::new(storage.clone(), config.clone());

        Self {
            jwt: Arc::new(JwtService::from_config(&config)),
            login_limiter: create_rate_limiter_with_quota(config.login_rate_per_minute),
            questions: QuestionService::new(storage.clone()),
            responses: ResponseService::new(storage.clone(), forms.clone()),
            roles: RoleService::new(storage.clone(), auth.clone()),
            forms,
            auth,
            storage,
            config,
        }
    }

    /// State backed by the in-memory store.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(Arc::new(config), Arc::new(MemoryStorageBackend::new()))
    }

    /// Connect the storage backend described by the configuration.
    ///
    /// With `DATABASE_URL` set this connects to PostgreSQL and runs the
    /// migrations; otherwise documents live in memory.
    pub async fn init_storage(config: &AppConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
        let Some(database_url) = config.database_url.as_deref() else {
            info!("DATABASE_URL not set, using in-memory storage");
            return Ok(Arc::new(MemoryStorageBackend::new()));
        };

        let pool = sqlx::PgPool::connect(database_url).await.map_err(|e| {
            StorageError::ConnectionError(format!("Failed to connect to database: {}", e))
        })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::ConnectionError(format!("Migration failed: {}", e)))?;

        info!("Connected to PostgreSQL storage");
        Ok(Arc::new(PostgresStorageBackend::new(pool)))
    }

    /// Seed the built-in roles and, when configured, the admin account.
    pub async fn bootstrap(&self) -> ServiceResult<()> {
        let seeded = self.auth.seed_default_roles().await?;
        if seeded > 0 {
            info!("Seeded {} default role(s)", seeded);
        }
        if let Some(admin) = &self.config.admin {
            self.auth.ensure_admin(admin).await?;
        }
        Ok(())
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for SharedJwtService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.jwt.clone()
    }
}
