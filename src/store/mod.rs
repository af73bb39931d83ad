pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RecordId;
use crate::models::inspection::{Inspection, InspectionStatus, NewInspection, UrgencyLevel};
use crate::models::notification::{NewNotification, Notification, NotificationStatus, Priority};
use crate::models::validation::contains_ignore_case;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Slice of a sorted result set. Both entities are returned newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub skip: u64,
    pub limit: i64,
}

impl PageRequest {
    pub fn first(limit: i64) -> Self {
        Self { skip: 0, limit }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilter {
    pub driver: Option<String>,
    pub warehouse: Option<String>,
    pub status: Option<NotificationStatus>,
    pub priority: Option<Priority>,
    pub unread_only: bool,
}

impl NotificationFilter {
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, notification: &Notification) -> bool {
        self.driver
            .as_deref()
            .is_none_or(|driver| contains_ignore_case(&notification.driver, driver))
            && self
                .warehouse
                .as_deref()
                .is_none_or(|warehouse| contains_ignore_case(&notification.warehouse, warehouse))
            && self.status.is_none_or(|status| notification.status == status)
            && self
                .priority
                .is_none_or(|priority| notification.priority == priority)
            && (!self.unread_only || !notification.is_read)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionFilter {
    pub driver: Option<String>,
    pub tractor_number: Option<String>,
    pub status: Option<InspectionStatus>,
    /// Matches any of the listed levels; empty means no constraint.
    pub urgency_levels: Vec<UrgencyLevel>,
}

impl InspectionFilter {
    pub fn with_status(status: InspectionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn urgent() -> Self {
        Self {
            urgency_levels: vec![UrgencyLevel::High, UrgencyLevel::Critical],
            ..Self::default()
        }
    }

    pub fn matches(&self, inspection: &Inspection) -> bool {
        self.driver
            .as_deref()
            .is_none_or(|driver| contains_ignore_case(&inspection.driver, driver))
            && self
                .tractor_number
                .as_deref()
                .is_none_or(|tractor| contains_ignore_case(&inspection.tractor_number, tractor))
            && self.status.is_none_or(|status| inspection.status == status)
            && (self.urgency_levels.is_empty()
                || self.urgency_levels.contains(&inspection.urgency_level))
    }
}

/// Persistent document store behind the HTTP handlers. Lookups that may
/// miss return `Ok(None)` and leave the not-found decision to the caller.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification, StoreError>;

    async fn find_notifications(
        &self,
        filter: &NotificationFilter,
        page: PageRequest,
    ) -> Result<Vec<Notification>, StoreError>;

    async fn count_notifications(&self, filter: &NotificationFilter) -> Result<u64, StoreError>;

    async fn get_notification(&self, id: &RecordId) -> Result<Option<Notification>, StoreError>;

    async fn mark_notification_read(
        &self,
        id: &RecordId,
    ) -> Result<Option<Notification>, StoreError>;

    async fn insert_inspection(&self, new: NewInspection) -> Result<Inspection, StoreError>;

    async fn find_inspections(
        &self,
        filter: &InspectionFilter,
        page: PageRequest,
    ) -> Result<Vec<Inspection>, StoreError>;

    async fn count_inspections(&self, filter: &InspectionFilter) -> Result<u64, StoreError>;

    async fn get_inspection(&self, id: &RecordId) -> Result<Option<Inspection>, StoreError>;

    async fn update_inspection_status(
        &self,
        id: &RecordId,
        status: InspectionStatus,
    ) -> Result<Option<Inspection>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);
}
