use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::models::validation::{FieldErrors, trimmed};
use crate::models::{RecordId, string_enum};

string_enum! {
    #[derive(Default)]
    NotificationStatus {
        #[default]
        EnRoute => "en-route",
        Arrived => "arrived",
        Delayed => "delayed",
        Completed => "completed",
    }
}

string_enum! {
    #[derive(Default)]
    Priority {
        Low => "low",
        #[default]
        Normal => "normal",
        High => "high",
        Urgent => "urgent",
    }
}

/// A driver's status ping as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub driver: String,
    pub status: NotificationStatus,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_arrival: Option<String>,
    pub warehouse: String,
    pub is_read: bool,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Untyped create body. Everything is optional here so that validation can
/// report every violated field at once.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub driver: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<String>,
    pub warehouse: Option<String>,
    pub is_read: Option<bool>,
    pub priority: Option<String>,
    pub notes: Option<String>,
}

/// A validated notification that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub driver: String,
    pub status: NotificationStatus,
    pub location: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<String>,
    pub warehouse: String,
    pub is_read: bool,
    pub priority: Priority,
    pub notes: Option<String>,
}

impl NotificationPayload {
    pub fn validate(self) -> Result<NewNotification, Vec<String>> {
        let mut errors = FieldErrors::new();

        let driver = errors.required("driver", self.driver);
        let status = errors.enumeration("status", self.status);
        let location = errors.required("location", self.location);
        let warehouse = errors.required("warehouse", self.warehouse);
        let priority = errors.enumeration("priority", self.priority);

        errors.into_result(|| NewNotification {
            driver: driver.unwrap_or_default(),
            status: status.unwrap_or_default(),
            location: location.unwrap_or_default(),
            timestamp: self.timestamp.map(|ts| ts.trunc_subsecs(3)),
            estimated_arrival: trimmed(self.estimated_arrival),
            warehouse: warehouse.unwrap_or_default(),
            is_read: self.is_read.unwrap_or(false),
            priority: priority.unwrap_or_default(),
            notes: self.notes.filter(|notes| !notes.is_empty()),
        })
    }
}

impl NewNotification {
    pub fn into_record(self, id: RecordId, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            driver: self.driver,
            status: self.status,
            location: self.location,
            timestamp: self.timestamp.unwrap_or(now),
            estimated_arrival: self.estimated_arrival,
            warehouse: self.warehouse,
            is_read: self.is_read,
            priority: self.priority,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}
