use crate::config::mongo_conf::MongoConfig;
use crate::model::quotation::{NewQuotation, Quotation, QuotationFile, QuotationStatus};
use crate::repository::repository_error::{parse_object_id, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::StreamExt;
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Persistence contract for quotations.
///
/// `update` is a full replacement guarded by the record's `version`: the
/// incoming record must carry the version it was read at, and the store bumps
/// it on success.
#[async_trait]
pub trait QuotationRepository: Send + Sync {
    async fn create(&self, fields: NewQuotation, owner_id: &str) -> RepositoryResult<Quotation>;
    async fn get_by_id(&self, id: &str) -> RepositoryResult<Quotation>;
    async fn update(&self, quotation: Quotation) -> RepositoryResult<Quotation>;
    async fn delete(&self, id: &str) -> RepositoryResult<()>;
    /// All quotations, newest first.
    async fn list(&self) -> RepositoryResult<Vec<Quotation>>;
}

/// Flat row stored in MongoDB. The milestone booleans are kept next to the
/// files for other readers of the collection and are always written from
/// file presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuotationDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    client: String,
    description: String,
    amount: f64,
    date: NaiveDate,
    status: QuotationStatus,
    purchase_order_created: bool,
    invoice_generated: bool,
    invoice_paid: bool,
    purchase_order_file: Option<QuotationFile>,
    invoice_file: Option<QuotationFile>,
    created_by: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
    version: i64,
}

impl QuotationDocument {
    fn from_quotation(quotation: &Quotation) -> RepositoryResult<Self> {
        let now = Utc::now();
        Ok(QuotationDocument {
            id: parse_object_id(&quotation.id)?,
            title: quotation.title.clone(),
            client: quotation.client.clone(),
            description: quotation.description.clone(),
            amount: quotation.amount,
            date: quotation.date,
            status: quotation.status,
            purchase_order_created: quotation.purchase_order_created(),
            invoice_generated: quotation.invoice_generated(),
            invoice_paid: quotation.invoice_paid,
            purchase_order_file: quotation.purchase_order_file.clone(),
            invoice_file: quotation.invoice_file.clone(),
            created_by: quotation.created_by.clone(),
            created_at: quotation.created_at.unwrap_or(now),
            updated_at: quotation.updated_at.unwrap_or(now),
            version: i64::try_from(quotation.version)
                .map_err(|_| RepositoryError::validation("Quotation version out of range"))?,
        })
    }
}

impl TryFrom<QuotationDocument> for Quotation {
    type Error = RepositoryError;

    fn try_from(doc: QuotationDocument) -> Result<Self, Self::Error> {
        let quotation = Quotation {
            id: doc.id.to_hex(),
            title: doc.title,
            client: doc.client,
            description: doc.description,
            amount: doc.amount,
            date: doc.date,
            status: doc.status,
            purchase_order_file: doc.purchase_order_file,
            invoice_file: doc.invoice_file,
            invoice_paid: doc.invoice_paid,
            created_by: doc.created_by,
            created_at: Some(doc.created_at),
            updated_at: Some(doc.updated_at),
            version: u64::try_from(doc.version).unwrap_or_default(),
        };
        quotation
            .check_flags(doc.purchase_order_created, doc.invoice_generated)
            .map_err(|e| {
                RepositoryError::serialization(format!("Inconsistent quotation {}: {}", quotation.id, e))
            })?;
        Ok(quotation)
    }
}

pub struct MongoQuotationRepository {
    collection: mongodb::Collection<QuotationDocument>,
}

impl MongoQuotationRepository {
    pub fn new(db: &mongodb::Database, config: &MongoConfig) -> Self {
        let collection = db.collection::<QuotationDocument>(&config.quotation_collection);
        MongoQuotationRepository { collection }
    }
}

#[async_trait]
impl QuotationRepository for MongoQuotationRepository {
    #[tracing::instrument(skip(self, fields), fields(title = %fields.title))]
    async fn create(&self, fields: NewQuotation, owner_id: &str) -> RepositoryResult<Quotation> {
        info!("Creating new quotation");
        let quotation = Quotation::from_new(ObjectId::new().to_hex(), fields, owner_id);
        let document = QuotationDocument::from_quotation(&quotation)?;

        match self.collection.insert_one(document, None).await {
            Ok(_) => {
                info!(id = %quotation.id, "Quotation created successfully");
                Ok(quotation)
            }
            Err(e) => {
                error!("Failed to create quotation: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> RepositoryResult<Quotation> {
        let oid = parse_object_id(id)?;
        match self.collection.find_one(doc! { "_id": oid }, None).await {
            Ok(Some(document)) => Quotation::try_from(document),
            Ok(None) => {
                error!("Quotation not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("Quotation not found for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to fetch quotation by ID: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self, quotation), fields(id = %quotation.id, version = quotation.version))]
    async fn update(&self, quotation: Quotation) -> RepositoryResult<Quotation> {
        info!("Updating quotation");
        let base_version = quotation.version;

        let mut stored = quotation;
        stored.version = base_version + 1;
        stored.updated_at = Some(Utc::now());
        let document = QuotationDocument::from_quotation(&stored)?;
        let filter = doc! { "_id": document.id, "version": document.version - 1 };

        let result = self.collection.replace_one(filter, &document, None).await.map_err(|e| {
            error!("Failed to update quotation: {}", e);
            RepositoryError::from(e)
        })?;

        if result.matched_count > 0 {
            info!("Quotation updated successfully");
            return Ok(stored);
        }

        // Nothing matched: either the record is gone or its version moved on.
        let exists = self
            .collection
            .count_documents(doc! { "_id": document.id }, None)
            .await
            .map_err(RepositoryError::from)?;
        if exists == 0 {
            error!("No quotation found to update for ID: {}", stored.id);
            Err(RepositoryError::not_found(format!("Quotation not found for ID: {}", stored.id)))
        } else {
            error!("Stale version {} for quotation {}", base_version, stored.id);
            Err(RepositoryError::conflict(format!(
                "Quotation {} was modified by someone else; reload and try again",
                stored.id
            )))
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let oid = parse_object_id(id)?;
        match self.collection.delete_one(doc! { "_id": oid }, None).await {
            Ok(result) if result.deleted_count > 0 => {
                info!("Quotation deleted successfully for ID: {}", id);
                Ok(())
            }
            Ok(_) => {
                error!("No quotation found to delete for ID: {}", id);
                Err(RepositoryError::not_found(format!("Quotation not found for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to delete quotation: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> RepositoryResult<Vec<Quotation>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let mut cursor = self.collection.find(doc! {}, options).await.map_err(|e| {
            error!("Failed to list quotations: {}", e);
            RepositoryError::from(e)
        })?;

        let mut quotations = Vec::new();
        while let Some(result) = cursor.next().await {
            match result {
                Ok(document) => quotations.push(Quotation::try_from(document)?),
                Err(e) => {
                    error!("Error reading quotation from cursor: {}", e);
                    return Err(RepositoryError::from(e));
                }
            }
        }
        info!(count = quotations.len(), "Quotations listed");
        Ok(quotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotation() -> Quotation {
        Quotation::from_new(
            ObjectId::new().to_hex(),
            NewQuotation {
                title: "Roof".to_string(),
                client: "Acme".to_string(),
                description: "Repair".to_string(),
                amount: 10.0,
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            },
            "owner",
        )
    }

    #[test]
    fn document_flags_follow_files() {
        let mut q = quotation();
        q.status = QuotationStatus::Approved;
        q.purchase_order_file = Some(QuotationFile::new("po.pdf", "/files/po.pdf"));
        let document = QuotationDocument::from_quotation(&q).unwrap();
        assert!(document.purchase_order_created);
        assert!(!document.invoice_generated);

        let back = Quotation::try_from(document).unwrap();
        assert_eq!(back.purchase_order_file, q.purchase_order_file);
        assert_eq!(back.id, q.id);
    }

    #[test]
    fn mismatched_flags_are_rejected_on_read() {
        let q = quotation();
        let mut document = QuotationDocument::from_quotation(&q).unwrap();
        document.invoice_generated = true;
        let err = Quotation::try_from(document).unwrap_err();
        assert!(matches!(err, RepositoryError::SerializationError(_)));
    }

    #[test]
    fn malformed_id_is_a_validation_error() {
        let mut q = quotation();
        q.id = "not-an-object-id".to_string();
        let err = QuotationDocument::from_quotation(&q).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));
    }
}
