use crate::config::mongo_conf::MongoConfig;
use crate::model::user::{NewUser, Role, User, UserChanges};
use crate::repository::repository_error::{parse_object_id, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken.
    async fn insert(&self, user: NewUser) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>>;
    /// All accounts, newest first.
    async fn list(&self) -> RepositoryResult<Vec<User>>;
    async fn update(&self, id: &str, changes: UserChanges) -> RepositoryResult<User>;
    async fn delete(&self, id: &str) -> RepositoryResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    avatar: Option<String>,
    role: Role,
    password_hash: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: doc.id.to_hex(),
            name: doc.name,
            email: doc.email,
            avatar: doc.avatar,
            role: doc.role,
            password_hash: doc.password_hash,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

fn changes_to_set(changes: &UserChanges) -> RepositoryResult<Document> {
    let mut set = doc! { "updated_at": bson::DateTime::from_chrono(Utc::now()) };
    if let Some(name) = &changes.name {
        set.insert("name", name);
    }
    if let Some(email) = &changes.email {
        set.insert("email", email);
    }
    if let Some(avatar) = &changes.avatar {
        set.insert("avatar", avatar);
    }
    if let Some(role) = changes.role {
        set.insert("role", bson::to_bson(&role)?);
    }
    if let Some(hash) = &changes.password_hash {
        set.insert("password_hash", hash);
    }
    Ok(set)
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<UserDocument>,
}

impl MongoUserRepository {
    /// Binds the user collection and makes sure emails are unique.
    pub async fn new(db: &mongodb::Database, config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let collection = db.collection::<UserDocument>(&config.user_collection);
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(index, None).await?;
        Ok(MongoUserRepository { collection })
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, user: NewUser) -> RepositoryResult<User> {
        let now = Utc::now();
        let document = UserDocument {
            id: ObjectId::new(),
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            role: user.role,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };

        match self.collection.insert_one(&document, None).await {
            Ok(_) => {
                info!("User inserted successfully");
                Ok(User::from(document))
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                match RepositoryError::from(e) {
                    RepositoryError::AlreadyExists(_) => Err(RepositoryError::already_exists(format!(
                        "A user with email {} already exists",
                        document.email
                    ))),
                    other => Err(other),
                }
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(|e| {
                error!("Failed to find user by email: {}", e);
                RepositoryError::from(e)
            })?;
        Ok(user.map(User::from))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let oid = parse_object_id(id)?;
        let user = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(|e| {
                error!("Failed to find user by id: {}", e);
                RepositoryError::from(e)
            })?;
        Ok(user.map(User::from))
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> RepositoryResult<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let mut cursor = self.collection.find(doc! {}, options).await.map_err(|e| {
            error!("Failed to list users: {}", e);
            RepositoryError::from(e)
        })?;

        let mut users = Vec::new();
        while let Some(result) = cursor.next().await {
            match result {
                Ok(document) => users.push(User::from(document)),
                Err(e) => {
                    error!("Error reading user from cursor: {}", e);
                    return Err(RepositoryError::from(e));
                }
            }
        }
        Ok(users)
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update(&self, id: &str, changes: UserChanges) -> RepositoryResult<User> {
        let oid = parse_object_id(id)?;
        let update = doc! { "$set": changes_to_set(&changes)? };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        match self.collection.find_one_and_update(doc! { "_id": oid }, update, options).await {
            Ok(Some(document)) => {
                info!("User updated successfully");
                Ok(User::from(document))
            }
            Ok(None) => {
                error!("No user found to update for ID: {}", id);
                Err(RepositoryError::not_found(format!("User not found for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to update user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let oid = parse_object_id(id)?;
        match self.collection.delete_one(doc! { "_id": oid }, None).await {
            Ok(result) if result.deleted_count > 0 => {
                info!("User deleted successfully");
                Ok(())
            }
            Ok(_) => Err(RepositoryError::not_found(format!("User not found for ID: {}", id))),
            Err(e) => {
                error!("Failed to delete user: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }
}
