#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use dashmap::DashMap;
use fleet_checkin::api::rest::router;
use fleet_checkin::models::inspection::{Inspection, InspectionStatus, NewInspection};
use fleet_checkin::models::notification::{NewNotification, Notification};
use fleet_checkin::models::{RecordId, now_millis};
use fleet_checkin::state::AppState;
use fleet_checkin::store::{
    DocumentStore, InspectionFilter, NotificationFilter, PageRequest, StoreError,
};
use serde_json::Value;

/// Test double for the document store, keyed the same way the real store is.
#[derive(Default)]
pub struct MemoryStore {
    notifications: DashMap<RecordId, Notification>,
    inspections: DashMap<RecordId, Inspection>,
    count_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }

    pub fn inspection_count(&self) -> usize {
        self.inspections.len()
    }

    /// Number of count queries served so far.
    pub fn count_queries(&self) -> usize {
        self.count_queries.load(Ordering::SeqCst)
    }
}

fn page_of<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.into_iter().skip(skip).take(limit).collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let record = new.into_record(RecordId::new(), now_millis());
        self.notifications.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_notifications(
        &self,
        filter: &NotificationFilter,
        page: PageRequest,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut matching: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(page_of(matching, page))
    }

    async fn count_notifications(&self, filter: &NotificationFilter) -> Result<u64, StoreError> {
        self.count_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .notifications
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count() as u64)
    }

    async fn get_notification(&self, id: &RecordId) -> Result<Option<Notification>, StoreError> {
        Ok(self.notifications.get(id).map(|entry| entry.value().clone()))
    }

    async fn mark_notification_read(
        &self,
        id: &RecordId,
    ) -> Result<Option<Notification>, StoreError> {
        Ok(self.notifications.get_mut(id).map(|mut entry| {
            entry.is_read = true;
            entry.updated_at = now_millis();
            entry.value().clone()
        }))
    }

    async fn insert_inspection(&self, new: NewInspection) -> Result<Inspection, StoreError> {
        let record = new.into_record(RecordId::new(), now_millis());
        self.inspections.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_inspections(
        &self,
        filter: &InspectionFilter,
        page: PageRequest,
    ) -> Result<Vec<Inspection>, StoreError> {
        let mut matching: Vec<Inspection> = self
            .inspections
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(page_of(matching, page))
    }

    async fn count_inspections(&self, filter: &InspectionFilter) -> Result<u64, StoreError> {
        self.count_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .inspections
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count() as u64)
    }

    async fn get_inspection(&self, id: &RecordId) -> Result<Option<Inspection>, StoreError> {
        Ok(self.inspections.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_inspection_status(
        &self,
        id: &RecordId,
        status: InspectionStatus,
    ) -> Result<Option<Inspection>, StoreError> {
        Ok(self.inspections.get_mut(id).map(|mut entry| {
            entry.status = status;
            entry.updated_at = now_millis();
            entry.value().clone()
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Error,
    Panic,
}

/// A store that is never reachable, or whose every call panics.
pub struct FailingStore(pub Failure);

impl FailingStore {
    fn fail<T>(&self) -> Result<T, StoreError> {
        match self.0 {
            Failure::Error => Err(StoreError::Unavailable("connection refused".to_string())),
            Failure::Panic => panic!("store exploded"),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert_notification(&self, _new: NewNotification) -> Result<Notification, StoreError> {
        self.fail()
    }

    async fn find_notifications(
        &self,
        _filter: &NotificationFilter,
        _page: PageRequest,
    ) -> Result<Vec<Notification>, StoreError> {
        self.fail()
    }

    async fn count_notifications(&self, _filter: &NotificationFilter) -> Result<u64, StoreError> {
        self.fail()
    }

    async fn get_notification(&self, _id: &RecordId) -> Result<Option<Notification>, StoreError> {
        self.fail()
    }

    async fn mark_notification_read(
        &self,
        _id: &RecordId,
    ) -> Result<Option<Notification>, StoreError> {
        self.fail()
    }

    async fn insert_inspection(&self, _new: NewInspection) -> Result<Inspection, StoreError> {
        self.fail()
    }

    async fn find_inspections(
        &self,
        _filter: &InspectionFilter,
        _page: PageRequest,
    ) -> Result<Vec<Inspection>, StoreError> {
        self.fail()
    }

    async fn count_inspections(&self, _filter: &InspectionFilter) -> Result<u64, StoreError> {
        self.fail()
    }

    async fn get_inspection(&self, _id: &RecordId) -> Result<Option<Inspection>, StoreError> {
        self.fail()
    }

    async fn update_inspection_status(
        &self,
        _id: &RecordId,
        _status: InspectionStatus,
    ) -> Result<Option<Inspection>, StoreError> {
        self.fail()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.fail()
    }

    async fn close(&self) {}
}

pub fn setup() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (app_with(store.clone(), "test"), store)
}

pub fn app_with(store: Arc<dyn DocumentStore>, environment: &str) -> Router {
    router(Arc::new(AppState::new(store, environment)))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn patch_request(uri: &str) -> Request<Body> {
    empty_request("PATCH", uri)
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
