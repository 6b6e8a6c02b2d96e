use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use crate::config::AdminUserConfig;
use crate::dto::user_dto::{AuthResponse, CreateUserRequest, UpdateProfileRequest, UpdateUserRequest};
use crate::model::user::{NewUser, Role, UserChanges, UserProfile};
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtTokenUtils, TokenPair, TokenSubject};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};
use crate::util::session::{Session, SessionRegistry};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Check your email and password.";

#[async_trait]
pub trait UserService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ServiceError>;
    async fn logout(&self, session: &Session) -> Result<(), ServiceError>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ServiceError>;
    async fn current_user(&self, session: &Session) -> Result<UserProfile, ServiceError>;
    async fn update_profile(&self, session: &Session, changes: UpdateProfileRequest) -> Result<UserProfile, ServiceError>;
    async fn list_users(&self) -> Result<Vec<UserProfile>, ServiceError>;
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserProfile, ServiceError>;
    async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> Result<UserProfile, ServiceError>;
    async fn delete_user(&self, session: &Session, id: &str) -> Result<(), ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
    pub sessions: Arc<SessionRegistry>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    PasswordUtilsImpl::validate_password_strength(password)
        .map_err(|errors| ServiceError::InvalidInput(errors.join("; ")))?;
    PasswordUtilsImpl::hash_password(password).map_err(|e| {
        error!("Password hash error: {e}");
        ServiceError::InternalError(format!("Password hash error: {e}"))
    })
}

impl UserServiceImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_utils: Arc<dyn JwtTokenUtils>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            user_repo,
            jwt_utils,
            sessions,
        }
    }

    fn issue_tokens(&self, session: &Session) -> Result<TokenPair, ServiceError> {
        self.jwt_utils
            .generate_token_pair(TokenSubject {
                user_id: &session.user_id,
                email: &session.email,
                role: session.role.as_str(),
                session_id: &session.session_id,
            })
            .map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))
    }

    fn changes_from(&self, request: UpdateUserRequest) -> Result<UserChanges, ServiceError> {
        let password_hash = match request.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        Ok(UserChanges {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email.as_deref().map(normalize_email),
            avatar: request.avatar,
            role: request.role,
            password_hash,
        })
    }

    /// Rejects an email change that would collide with another account.
    async fn ensure_email_free(&self, changes: &UserChanges, user_id: &str) -> Result<(), ServiceError> {
        let Some(email) = changes.email.as_deref() else {
            return Ok(());
        };
        match self.user_repo.find_by_email(email).await? {
            Some(other) if other.id != user_id => {
                warn!("Email already registered");
                Err(ServiceError::Conflict(format!("A user with email {} already exists", email)))
            }
            _ => Ok(()),
        }
    }

    /// Creates the configured administrator unless an account with that
    /// email already exists.
    #[instrument(skip(self, config), fields(email = %config.email))]
    pub async fn bootstrap_admin(&self, config: &AdminUserConfig) -> Result<(), ServiceError> {
        let email = normalize_email(&config.email);
        if self.user_repo.find_by_email(&email).await?.is_some() {
            info!("Admin user already exists");
            return Ok(());
        }
        let password_hash = PasswordUtilsImpl::hash_password(&config.password)
            .map_err(|e| ServiceError::InternalError(format!("Password hash error: {e}")))?;
        self.user_repo
            .insert(NewUser {
                name: config.name.clone(),
                email,
                avatar: None,
                role: Role::Admin,
                password_hash,
            })
            .await?;
        info!("Admin user created");
        Ok(())
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ServiceError> {
        info!("User login attempt");
        let user = match self.user_repo.find_by_email(&normalize_email(email)).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Login for unknown email");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
            Err(e) => {
                error!("Failed to fetch user for login: {e}");
                return Err(ServiceError::from(e));
            }
        };

        let valid = PasswordUtilsImpl::verify_password(password, &user.password_hash).map_err(|e| {
            error!("Stored password hash unusable: {e}");
            ServiceError::InternalError(format!("Password verify error: {}", e))
        })?;
        if !valid {
            warn!("Invalid credentials");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let session = self.sessions.open(&user).await;
        let tokens = match self.issue_tokens(&session) {
            Ok(tokens) => tokens,
            Err(e) => {
                self.sessions.close(&session.session_id).await;
                return Err(e);
            }
        };
        info!(user_id = %user.id, "User logged in successfully");
        Ok(AuthResponse {
            user: UserProfile::from(user),
            tokens,
        })
    }

    #[instrument(skip(self, session), fields(session_id = %session.session_id))]
    async fn logout(&self, session: &Session) -> Result<(), ServiceError> {
        if !self.sessions.close(&session.session_id).await {
            warn!("Logout for a session that was already closed");
        }
        info!("User logged out");
        Ok(())
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self
            .jwt_utils
            .validate_refresh_token(refresh_token)
            .map_err(|e| ServiceError::Unauthorized(format!("Invalid refresh token: {}", e)))?;
        let session = self
            .sessions
            .touch(&claims.sid)
            .await
            .ok_or_else(|| ServiceError::Unauthorized("Session has ended; sign in again".to_string()))?;
        let tokens = self.issue_tokens(&session)?;
        info!("Token refreshed successfully");
        Ok(tokens)
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn current_user(&self, session: &Session) -> Result<UserProfile, ServiceError> {
        match self.user_repo.find_by_id(&session.user_id).await? {
            Some(user) => Ok(UserProfile::from(user)),
            None => {
                // The account was removed while the session was alive.
                self.sessions.close(&session.session_id).await;
                Err(ServiceError::Unauthorized("Account no longer exists".to_string()))
            }
        }
    }

    #[instrument(skip(self, session, changes), fields(user_id = %session.user_id))]
    async fn update_profile(&self, session: &Session, changes: UpdateProfileRequest) -> Result<UserProfile, ServiceError> {
        let changes = self.changes_from(UpdateUserRequest::from(changes))?;
        if changes.is_empty() {
            return self.current_user(session).await;
        }
        self.ensure_email_free(&changes, &session.user_id).await?;
        let user = self.user_repo.update(&session.user_id, changes).await?;
        self.sessions.update_user(&user).await;
        info!("Profile updated");
        Ok(UserProfile::from(user))
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserProfile>, ServiceError> {
        let users = self.user_repo.list().await.map_err(|e| {
            error!("Failed to list users: {e}");
            ServiceError::from(e)
        })?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn create_user(&self, request: CreateUserRequest) -> Result<UserProfile, ServiceError> {
        let email = normalize_email(&request.email);
        if self.user_repo.find_by_email(&email).await?.is_some() {
            warn!("Email already registered");
            return Err(ServiceError::Conflict(format!("A user with email {} already exists", email)));
        }
        let password_hash = hash_password(&request.password)?;
        let res = self
            .user_repo
            .insert(NewUser {
                name: request.name.trim().to_string(),
                email,
                avatar: request.avatar,
                role: request.role,
                password_hash,
            })
            .await;
        match &res {
            Ok(user) => info!(user_id = %user.id, "User created"),
            Err(e) => error!("Failed to create user: {e}"),
        }
        res.map(UserProfile::from).map_err(ServiceError::from)
    }

    #[instrument(skip(self, changes))]
    async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> Result<UserProfile, ServiceError> {
        let changes = self.changes_from(changes)?;
        if changes.is_empty() {
            return Err(ServiceError::InvalidInput("No changes supplied".to_string()));
        }
        self.ensure_email_free(&changes, id).await?;
        let user = self.user_repo.update(id, changes).await.map_err(|e| {
            error!("Failed to update user: {e}");
            ServiceError::from(e)
        })?;
        self.sessions.update_user(&user).await;
        info!("User updated");
        Ok(UserProfile::from(user))
    }

    #[instrument(skip(self, session), fields(actor = %session.user_id))]
    async fn delete_user(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        if session.user_id == id {
            warn!("Attempt to delete own account");
            return Err(ServiceError::InvalidInput("You cannot delete your own account".to_string()));
        }
        self.user_repo.delete(id).await.map_err(|e| {
            error!("Failed to delete user: {e}");
            ServiceError::from(e)
        })?;
        self.sessions.close_all_for_user(id).await;
        info!("User deleted");
        Ok(())
    }
}
