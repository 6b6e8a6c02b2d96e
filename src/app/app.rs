use std::sync::Arc;

use axum::{routing::get, Router};
use chrono::Duration;
use tracing::{info, warn};

use crate::config::{AdminUserConfig, AppConfig, ConfigError, JwtConfig, MongoConfig, StorageConfig, StoreBackend};
use crate::middlewares::auth_middleware::AuthState;
use crate::repository::memory::{InMemoryQuotationRepository, InMemoryUserRepository};
use crate::repository::mongo;
use crate::repository::quotation_repo::{MongoQuotationRepository, QuotationRepository};
use crate::repository::user_repo::{MongoUserRepository, UserRepository};
use crate::router::quotation_router::quotation_router;
use crate::router::user_router::user_router;
use crate::service::quotation_service::QuotationServiceImpl;
use crate::service::user_service::UserServiceImpl;
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use crate::util::session::SessionRegistry;
use crate::util::storage::{FileStorage, LocalFileStorage};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("Startup error: {0}")]
    Service(#[from] ServiceError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assembles the HTTP surface from ready-made services.
pub fn build_router(
    quotation_service: Arc<QuotationServiceImpl>,
    user_service: Arc<UserServiceImpl>,
    auth_state: Arc<AuthState>,
) -> Router {
    Router::new()
        .merge(quotation_router(quotation_service, auth_state.clone()))
        .merge(user_router(user_service, auth_state))
        .route("/health", get(|| async { "OK" }))
}

pub struct App {
    config: AppConfig,
    router: Router,
    pub user_service: Arc<UserServiceImpl>,
    pub quotation_service: Arc<QuotationServiceImpl>,
}

impl App {
    pub async fn new() -> Result<Self, AppError> {
        let config = AppConfig::from_env()?;
        let jwt_config = JwtConfig::from_env()?;
        let storage_config = StorageConfig::from_env()?;

        let (quotation_repo, user_repo): (Arc<dyn QuotationRepository>, Arc<dyn UserRepository>) =
            match config.store_backend {
                StoreBackend::Mongo => {
                    let mongo_config = MongoConfig::from_env()?;
                    let db = mongo::connect(&mongo_config).await?;
                    (
                        Arc::new(MongoQuotationRepository::new(&db, &mongo_config)),
                        Arc::new(MongoUserRepository::new(&db, &mongo_config).await?),
                    )
                }
                StoreBackend::Memory => {
                    warn!("Using in-memory stores; data is lost on shutdown");
                    (
                        Arc::new(InMemoryQuotationRepository::new()),
                        Arc::new(InMemoryUserRepository::new()),
                    )
                }
            };

        let sessions = Arc::new(SessionRegistry::with_lifetime(Duration::minutes(
            jwt_config.refresh_token_expiration,
        )));
        let jwt_utils: Arc<dyn JwtTokenUtils> = Arc::new(JwtTokenUtilsImpl::new(jwt_config));
        let file_storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(&storage_config));

        let user_service = Arc::new(UserServiceImpl::new(user_repo, jwt_utils.clone(), sessions.clone()));
        let quotation_service = Arc::new(QuotationServiceImpl::new(
            quotation_repo,
            file_storage,
            storage_config.max_upload_bytes,
        ));
        let auth_state = Arc::new(AuthState { jwt_utils, sessions });

        let router = build_router(quotation_service.clone(), user_service.clone(), auth_state);
        let app = App {
            config,
            router,
            user_service,
            quotation_service,
        };
        app.create_first_admin_user().await?;
        Ok(app)
    }

    async fn create_first_admin_user(&self) -> Result<(), AppError> {
        match AdminUserConfig::from_env() {
            Ok(admin) => Ok(self.user_service.bootstrap_admin(&admin).await?),
            Err(e) => {
                warn!("Admin user config not loaded: {e}");
                Ok(())
            }
        }
    }

    pub async fn start(self) -> Result<(), AppError> {
        let addr = self.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Server running at http://{}", addr);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
