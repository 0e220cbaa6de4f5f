use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Database;

use crate::error::StoreError;
use crate::models::{Alert, AlertCondition};

/// Durable persistence for alert records. Ids are assigned by the store and
/// never reused; ordering of `load_all`/`list_for_user` is insertion order.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert(
        &self,
        user_id: i64,
        ticker: &str,
        condition: AlertCondition,
    ) -> Result<Alert, StoreError>;

    async fn remove(&self, alert_id: i64) -> Result<(), StoreError>;

    async fn load_all(&self) -> Result<Vec<Alert>, StoreError>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Alert>, StoreError>;
}

pub struct MongoAlertStore {
    db: Database,
}

impl MongoAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Auto-increment contract on Mongo: one counter document per sequence,
    /// bumped atomically.
    async fn next_id(&self) -> Result<i64, StoreError> {
        let counters = self.db.collection::<Document>("counters");

        let opts = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = counters
            .find_one_and_update(doc! { "_id": "alerts" }, doc! { "$inc": { "seq": 1_i64 } }, opts)
            .await?
            .ok_or(StoreError::MissingCounter)?;

        counter.get_i64("seq").map_err(|_| StoreError::MissingCounter)
    }

    async fn drain(
        &self,
        filter: Option<Document>,
    ) -> Result<Vec<Alert>, StoreError> {
        let alerts = self.db.collection::<Alert>("alerts");
        let find_opts = FindOptions::builder().sort(doc! { "_id": 1 }).build();

        let mut cursor = alerts.find(filter, find_opts).await?;

        let mut items: Vec<Alert> = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res?);
        }
        Ok(items)
    }
}

#[async_trait]
impl AlertStore for MongoAlertStore {
    async fn insert(
        &self,
        user_id: i64,
        ticker: &str,
        condition: AlertCondition,
    ) -> Result<Alert, StoreError> {
        let alert = Alert {
            id: self.next_id().await?,
            user_id,
            ticker: ticker.to_string(),
            condition,
            created_at: Utc::now().timestamp(),
        };

        self.db
            .collection::<Alert>("alerts")
            .insert_one(&alert, None)
            .await?;

        Ok(alert)
    }

    async fn remove(&self, alert_id: i64) -> Result<(), StoreError> {
        let res = self
            .db
            .collection::<Alert>("alerts")
            .delete_one(doc! { "_id": alert_id }, None)
            .await?;

        if res.deleted_count == 0 {
            return Err(StoreError::NotFound(alert_id));
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Alert>, StoreError> {
        self.drain(None).await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Alert>, StoreError> {
        self.drain(Some(doc! { "user_id": user_id })).await
    }
}
