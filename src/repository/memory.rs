//! In-process stores used by tests and by `STORE_BACKEND=memory`.

use crate::model::quotation::{NewQuotation, Quotation};
use crate::model::user::{NewUser, User, UserChanges};
use crate::repository::quotation_repo::QuotationRepository;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::user_repo::UserRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Quotations kept in insertion order; listing reverses it.
#[derive(Default)]
pub struct InMemoryQuotationRepository {
    quotations: RwLock<Vec<Quotation>>,
}

impl InMemoryQuotationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotationRepository for InMemoryQuotationRepository {
    async fn create(&self, fields: NewQuotation, owner_id: &str) -> RepositoryResult<Quotation> {
        let quotation = Quotation::from_new(ObjectId::new().to_hex(), fields, owner_id);
        self.quotations.write().await.push(quotation.clone());
        info!(id = %quotation.id, "Quotation stored in memory");
        Ok(quotation)
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Quotation> {
        self.quotations
            .read()
            .await
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Quotation not found for ID: {}", id)))
    }

    async fn update(&self, quotation: Quotation) -> RepositoryResult<Quotation> {
        let mut quotations = self.quotations.write().await;
        let slot = quotations
            .iter_mut()
            .find(|q| q.id == quotation.id)
            .ok_or_else(|| RepositoryError::not_found(format!("Quotation not found for ID: {}", quotation.id)))?;

        if slot.version != quotation.version {
            error!(id = %quotation.id, stored = slot.version, given = quotation.version, "Stale quotation version");
            return Err(RepositoryError::conflict(format!(
                "Quotation {} was modified by someone else; reload and try again",
                quotation.id
            )));
        }

        let mut stored = quotation;
        stored.version += 1;
        stored.updated_at = Some(Utc::now());
        *slot = stored.clone();
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let mut quotations = self.quotations.write().await;
        let before = quotations.len();
        quotations.retain(|q| q.id != id);
        if quotations.len() == before {
            return Err(RepositoryError::not_found(format!("Quotation not found for ID: {}", id)));
        }
        Ok(())
    }

    async fn list(&self) -> RepositoryResult<Vec<Quotation>> {
        Ok(self.quotations.read().await.iter().rev().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::already_exists(format!(
                "A user with email {} already exists",
                user.email
            )));
        }
        let now = Utc::now();
        let stored = User {
            id: ObjectId::new().to_hex(),
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            role: user.role,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.users.read().await.iter().rev().cloned().collect())
    }

    async fn update(&self, id: &str, changes: UserChanges) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(RepositoryError::already_exists(format!(
                    "A user with email {} already exists",
                    email
                )));
            }
        }
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| RepositoryError::not_found(format!("User not found for ID: {}", id)))?;
        changes.apply_to(user);
        Ok(user.clone())
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(RepositoryError::not_found(format!("User not found for ID: {}", id)));
        }
        Ok(())
    }
}
