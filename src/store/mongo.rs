use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{self, Document, doc};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::models::inspection::{
    FuelLevel, Inspection, InspectionStatus, NewInspection, UrgencyLevel,
};
use crate::models::notification::{NewNotification, Notification, NotificationStatus, Priority};
use crate::models::{RecordId, now_millis};
use crate::store::{
    DocumentStore, InspectionFilter, NotificationFilter, PageRequest, StoreError,
};

const NOTIFICATIONS: &str = "notifications";
const INSPECTIONS: &str = "inspections";

pub struct MongoStore {
    client: Client,
    database: Database,
    notifications: Collection<NotificationDocument>,
    inspections: Collection<InspectionDocument>,
}

impl MongoStore {
    /// Connects, pings and prepares indexes. Any failure here means the
    /// service should not start taking traffic.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.mongodb_uri).await?;
        let timeout = Duration::from_millis(config.db_connect_timeout_ms);
        options.app_name = Some("fleet-checkin".to_string());
        options.max_pool_size = Some(config.db_max_pool_size);
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(&config.mongodb_database));

        let store = Self {
            notifications: database.collection(NOTIFICATIONS),
            inspections: database.collection(INSPECTIONS),
            database,
            client,
        };

        store.ping().await?;
        store.ensure_indexes().await?;

        info!(database = %store.database.name(), "connected to document store");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        self.notifications
            .create_indexes(
                [
                    IndexModel::builder().keys(doc! { "timestamp": -1 }).build(),
                    IndexModel::builder().keys(doc! { "isRead": 1 }).build(),
                ],
                None,
            )
            .await?;

        self.inspections
            .create_indexes(
                [
                    IndexModel::builder().keys(doc! { "submittedAt": -1 }).build(),
                    IndexModel::builder().keys(doc! { "status": 1 }).build(),
                ],
                None,
            )
            .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let record = new.into_record(RecordId::new(), now_millis());
        self.notifications
            .insert_one(NotificationDocument::from(record.clone()), None)
            .await?;
        Ok(record)
    }

    async fn find_notifications(
        &self,
        filter: &NotificationFilter,
        page: PageRequest,
    ) -> Result<Vec<Notification>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .skip(page.skip)
            .limit(page.limit)
            .build();

        let documents: Vec<NotificationDocument> = self
            .notifications
            .find(notification_query(filter), options)
            .await?
            .try_collect()
            .await?;

        Ok(documents.into_iter().map(Notification::from).collect())
    }

    async fn count_notifications(&self, filter: &NotificationFilter) -> Result<u64, StoreError> {
        Ok(self
            .notifications
            .count_documents(notification_query(filter), None)
            .await?)
    }

    async fn get_notification(&self, id: &RecordId) -> Result<Option<Notification>, StoreError> {
        let document = self
            .notifications
            .find_one(doc! { "_id": id.as_object_id() }, None)
            .await?;
        Ok(document.map(Notification::from))
    }

    async fn mark_notification_read(
        &self,
        id: &RecordId,
    ) -> Result<Option<Notification>, StoreError> {
        let update = doc! {
            "$set": { "isRead": true, "updatedAt": bson::DateTime::from_chrono(now_millis()) }
        };
        let document = self
            .notifications
            .find_one_and_update(doc! { "_id": id.as_object_id() }, update, return_updated())
            .await?;
        Ok(document.map(Notification::from))
    }

    async fn insert_inspection(&self, new: NewInspection) -> Result<Inspection, StoreError> {
        let record = new.into_record(RecordId::new(), now_millis());
        self.inspections
            .insert_one(InspectionDocument::from(record.clone()), None)
            .await?;
        Ok(record)
    }

    async fn find_inspections(
        &self,
        filter: &InspectionFilter,
        page: PageRequest,
    ) -> Result<Vec<Inspection>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "submittedAt": -1 })
            .skip(page.skip)
            .limit(page.limit)
            .build();

        let documents: Vec<InspectionDocument> = self
            .inspections
            .find(inspection_query(filter), options)
            .await?
            .try_collect()
            .await?;

        Ok(documents.into_iter().map(Inspection::from).collect())
    }

    async fn count_inspections(&self, filter: &InspectionFilter) -> Result<u64, StoreError> {
        Ok(self
            .inspections
            .count_documents(inspection_query(filter), None)
            .await?)
    }

    async fn get_inspection(&self, id: &RecordId) -> Result<Option<Inspection>, StoreError> {
        let document = self
            .inspections
            .find_one(doc! { "_id": id.as_object_id() }, None)
            .await?;
        Ok(document.map(Inspection::from))
    }

    async fn update_inspection_status(
        &self,
        id: &RecordId,
        status: InspectionStatus,
    ) -> Result<Option<Inspection>, StoreError> {
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "updatedAt": bson::DateTime::from_chrono(now_millis()),
            }
        };
        let document = self
            .inspections
            .find_one_and_update(doc! { "_id": id.as_object_id() }, update, return_updated())
            .await?;
        Ok(document.map(Inspection::from))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match *err.kind {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Operation(err.to_string()),
        }
    }
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

fn notification_query(filter: &NotificationFilter) -> Document {
    let mut query = Document::new();
    if let Some(driver) = &filter.driver {
        query.insert("driver", contains_pattern(driver));
    }
    if let Some(warehouse) = &filter.warehouse {
        query.insert("warehouse", contains_pattern(warehouse));
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if let Some(priority) = filter.priority {
        query.insert("priority", priority.as_str());
    }
    if filter.unread_only {
        query.insert("isRead", false);
    }
    query
}

fn inspection_query(filter: &InspectionFilter) -> Document {
    let mut query = Document::new();
    if let Some(driver) = &filter.driver {
        query.insert("driver", contains_pattern(driver));
    }
    if let Some(tractor) = &filter.tractor_number {
        query.insert("tractorNumber", contains_pattern(tractor));
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if !filter.urgency_levels.is_empty() {
        let levels: Vec<&str> = filter.urgency_levels.iter().map(|level| level.as_str()).collect();
        query.insert("urgencyLevel", doc! { "$in": levels });
    }
    query
}

/// Case-insensitive substring match. User input is matched literally.
fn contains_pattern(needle: &str) -> Document {
    doc! { "$regex": regex::escape(needle), "$options": "i" }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    driver: String,
    status: NotificationStatus,
    location: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_arrival: Option<String>,
    warehouse: String,
    #[serde(default)]
    is_read: bool,
    priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDocument {
    fn from(record: Notification) -> Self {
        Self {
            id: record.id.as_object_id(),
            driver: record.driver,
            status: record.status,
            location: record.location,
            timestamp: record.timestamp,
            estimated_arrival: record.estimated_arrival,
            warehouse: record.warehouse,
            is_read: record.is_read,
            priority: record.priority,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<NotificationDocument> for Notification {
    fn from(document: NotificationDocument) -> Self {
        Self {
            id: RecordId::from(document.id),
            driver: document.driver,
            status: document.status,
            location: document.location,
            timestamp: document.timestamp,
            estimated_arrival: document.estimated_arrival,
            warehouse: document.warehouse,
            is_read: document.is_read,
            priority: document.priority,
            notes: document.notes,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectionDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    driver: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    check_in_time: DateTime<Utc>,
    tractor_number: String,
    trailer_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    moffett_number: Option<String>,
    odometer_reading: f64,
    fuel_level: FuelLevel,
    #[serde(default)]
    safety_checks: Vec<String>,
    #[serde(default)]
    equipment_checks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    damage_found: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repairs_needed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    additional_comments: Option<String>,
    urgency_level: UrgencyLevel,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    submitted_at: DateTime<Utc>,
    status: InspectionStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<Inspection> for InspectionDocument {
    fn from(record: Inspection) -> Self {
        Self {
            id: record.id.as_object_id(),
            driver: record.driver,
            check_in_time: record.check_in_time,
            tractor_number: record.tractor_number,
            trailer_number: record.trailer_number,
            moffett_number: record.moffett_number,
            odometer_reading: record.odometer_reading,
            fuel_level: record.fuel_level,
            safety_checks: record.safety_checks,
            equipment_checks: record.equipment_checks,
            damage_found: record.damage_found,
            repairs_needed: record.repairs_needed,
            delivery_notes: record.delivery_notes,
            additional_comments: record.additional_comments,
            urgency_level: record.urgency_level,
            submitted_at: record.submitted_at,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<InspectionDocument> for Inspection {
    fn from(document: InspectionDocument) -> Self {
        Self {
            id: RecordId::from(document.id),
            driver: document.driver,
            check_in_time: document.check_in_time,
            tractor_number: document.tractor_number,
            trailer_number: document.trailer_number,
            moffett_number: document.moffett_number,
            odometer_reading: document.odometer_reading,
            fuel_level: document.fuel_level,
            safety_checks: document.safety_checks,
            equipment_checks: document.equipment_checks,
            damage_found: document.damage_found,
            repairs_needed: document.repairs_needed,
            delivery_notes: document.delivery_notes,
            additional_comments: document.additional_comments,
            urgency_level: document.urgency_level,
            submitted_at: document.submitted_at,
            status: document.status,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}
