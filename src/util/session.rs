use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::model::user::{Role, User};

/// Signed-in user context. Created on login, destroyed on logout.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Pushed forward on every token refresh.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Matches the default refresh token lifetime.
const DEFAULT_SESSION_LIFETIME_MINUTES: i64 = 10080;

/// Live sessions keyed by session id. Tokens carry the id, so a token whose
/// session is gone is rejected even before it expires.
///
/// A session lives as long as a refresh token; expired entries are treated
/// as absent and dropped on the next `open` or lookup.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    lifetime: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_lifetime(Duration::minutes(DEFAULT_SESSION_LIFETIME_MINUTES))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
            lifetime,
        }
    }

    pub async fn open(&self, user: &User) -> Session {
        let now = Utc::now();
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            expires_at: now + self.lifetime,
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "Pruned expired sessions");
        }
        sessions.insert(session.session_id.clone(), session.clone());
        info!(user_id = %user.id, session_id = %session.session_id, "Session opened");
        session
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut sessions = self.sessions.write().await;
        if sessions.get(session_id).is_some_and(|s| s.is_expired(now)) {
            sessions.remove(session_id);
            debug!(session_id, "Expired session removed");
        }
        None
    }

    /// Extends a live session by a full lifetime.
    pub async fn touch(&self, session_id: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id)?;
        if session.is_expired(now) {
            sessions.remove(session_id);
            return None;
        }
        session.expires_at = now + self.lifetime;
        Some(session.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns `false` when the session was already closed.
    pub async fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        debug!(session_id, removed, "Session close requested");
        removed
    }

    pub async fn close_all_for_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        let closed = before - sessions.len();
        if closed > 0 {
            info!(user_id, closed, "Closed sessions of user");
        }
        closed
    }

    /// Keeps live sessions in step with a role change.
    pub async fn update_user(&self, user: &User) {
        let mut sessions = self.sessions.write().await;
        for session in sessions.values_mut().filter(|s| s.user_id == user.id) {
            session.role = user.role;
            session.email = user.email.clone();
        }
    }
}
