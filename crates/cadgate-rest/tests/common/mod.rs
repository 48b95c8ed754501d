//! Test harness: the real router over an in-memory cache and a fake CAD.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use cadgate_client::{CadApi, CallServiceRecord, GeofenceSet, LocationUpdate};
use cadgate_config::ServerConfig;
use cadgate_core::{CadgateError, CadgateResult, GuestShare, Tenant};
use cadgate_rest::{create_router, AppState};
use cadgate_service::{CadServiceImpl, EventPublisher, InMemoryCache, ReadThroughCache};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TOKEN: &str = "abc123";

#[derive(Default)]
pub struct FakeCad {
    pub record: Mutex<Option<CallServiceRecord>>,
    pub fail: AtomicBool,
    pub location_accepted: AtomicBool,
    pub call_service_calls: AtomicUsize,
    pub geofence_calls: AtomicUsize,
}

impl FakeCad {
    pub fn with_record() -> Self {
        let fake = Self::default();
        *fake.record.lock().unwrap() = Some(CallServiceRecord {
            call_service_guid: Some("cs-1".to_string()),
            call_status: Some("En Route".to_string()),
            region_id: Some(7),
            ..Default::default()
        });
        fake.location_accepted.store(true, Ordering::SeqCst);
        fake
    }

    pub fn call_service_calls(&self) -> usize {
        self.call_service_calls.load(Ordering::SeqCst)
    }

    pub fn geofence_calls(&self) -> usize {
        self.geofence_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> CadgateResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CadgateError::upstream("cad", "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl CadApi for FakeCad {
    async fn call_service(
        &self,
        _tenant: &Tenant,
        _share: &GuestShare,
    ) -> CadgateResult<Option<CallServiceRecord>> {
        self.call_service_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.record.lock().unwrap().clone())
    }

    async fn geofence(
        &self,
        _tenant: &Tenant,
        _share: &GuestShare,
    ) -> CadgateResult<Option<GeofenceSet>> {
        self.geofence_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(Some(GeofenceSet::default()))
    }

    async fn update_location(
        &self,
        _tenant: &Tenant,
        _share: &GuestShare,
        _update: &LocationUpdate,
    ) -> CadgateResult<bool> {
        self.check()?;
        Ok(self.location_accepted.load(Ordering::SeqCst))
    }
}

pub struct TestApp {
    pub router: Router,
    pub cad: Arc<FakeCad>,
    pub events: EventPublisher,
}

impl TestApp {
    pub fn new(cad: FakeCad) -> Self {
        Self::with_secret(cad, None)
    }

    pub fn with_secret(cad: FakeCad, secret: Option<&str>) -> Self {
        let cad = Arc::new(cad);
        let store = Arc::new(InMemoryCache::new());
        let events = EventPublisher::default();
        let service = CadServiceImpl::new(
            cad.clone(),
            ReadThroughCache::new(store.clone()),
            events.clone(),
        );
        let state = AppState::new(Arc::new(service), store, events.clone())
            .with_webhook_secret(secret.map(str::to_string));
        let router = create_router(state, &ServerConfig::default());
        Self { router, cad, events }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(uri, body)).await
    }
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn guest_uri() -> String {
    format!("/?tenant=pm&id=42&token={TOKEN}")
}
