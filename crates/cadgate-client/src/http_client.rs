//! reqwest-based CAD API client.

use crate::models::LocationRequestBody;
use crate::{CadApi, CallServiceRecord, GeofenceSet, LocationUpdate};
use async_trait::async_trait;
use cadgate_config::CadConfig;
use cadgate_core::{CadgateError, CadgateResult, GuestShare, Tenant};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Service name used in upstream errors.
const SERVICE: &str = "cad";

/// Body keys never written to logs.
const REDACTED_KEYS: [&str; 5] = ["password", "api_key", "api_secret", "token", "refresh_token"];

/// HTTP client for the CAD API.
///
/// One client is shared across tenants; the tenant only changes the host.
pub struct HttpCadClient {
    client: Client,
    base_url: Url,
    tenant_subdomains: bool,
}

impl HttpCadClient {
    /// Creates a client from configuration.
    pub fn new(config: &CadConfig) -> CadgateResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| CadgateError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, &config.base_url, config.tenant_subdomains)
    }

    /// Creates a client around a preconfigured `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str, tenant_subdomains: bool) -> CadgateResult<Self> {
        let mut base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            CadgateError::Configuration(format!("Invalid CAD base URL '{}': {}", base_url, e))
        })?;

        if base_url.host_str().is_none() {
            return Err(CadgateError::Configuration(format!(
                "CAD base URL '{}' has no host",
                base_url
            )));
        }

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            tenant_subdomains,
        })
    }

    /// Resolves the base URL for a tenant: `https://{tenant}.{host}`.
    pub fn tenant_base_url(&self, tenant: &Tenant) -> CadgateResult<Url> {
        let mut url = self.base_url.clone();

        if self.tenant_subdomains {
            let host = self.base_url.host_str().unwrap_or_default();
            let tenant_host = format!("{}.{}", tenant, host);
            url.set_host(Some(&tenant_host)).map_err(|e| {
                CadgateError::validation(format!("Tenant '{}' is not a valid host label: {}", tenant, e))
            })?;
        }

        Ok(url)
    }

    fn endpoint(&self, tenant: &Tenant, path: &str) -> CadgateResult<Url> {
        self.tenant_base_url(tenant)?
            .join(path)
            .map_err(|e| CadgateError::Internal(format!("Invalid CAD endpoint '{}': {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        path: &str,
    ) -> CadgateResult<Option<T>> {
        let url = self.endpoint(tenant, path)?;

        debug!(
            target: "cadgate::upstream",
            method = "GET",
            url = %url,
            tenant = %tenant,
            guest_share_id = share.id,
            token_hash = %share.token_hash(),
            "CAD request"
        );

        let response = self
            .client
            .get(url.clone())
            .query(&[("token", share.token.expose())])
            .send()
            .await
            .map_err(transport_error)?;

        let Some(response) = successful(response, &url) else {
            return Ok(None);
        };

        let value = response
            .json::<T>()
            .await
            .map_err(|e| CadgateError::upstream(SERVICE, format!("Invalid response body: {}", e)))?;

        Ok(Some(value))
    }
}

/// Logs the response status and keeps it only when it is a 2xx.
fn successful(response: Response, url: &Url) -> Option<Response> {
    let status = response.status();
    debug!(target: "cadgate::upstream", status = status.as_u16(), url = %url, "CAD response");

    if status.is_success() {
        Some(response)
    } else {
        warn!(status = status.as_u16(), url = %url, "CAD responded with non-success status");
        None
    }
}

fn transport_error(err: reqwest::Error) -> CadgateError {
    // reqwest embeds the full URL (query included) in its Display output.
    let err = err.without_url();
    if err.is_timeout() {
        CadgateError::Timeout(format!("CAD request timed out: {}", err))
    } else {
        CadgateError::upstream(SERVICE, err.to_string())
    }
}

/// Replaces sensitive top-level keys of a JSON body for logging.
#[must_use]
pub fn redact_body(body: &Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lowered = key.to_lowercase();
                    if REDACTED_KEYS.contains(&lowered.as_str()) {
                        (key.clone(), Value::String("***REDACTED***".to_string()))
                    } else {
                        (key.clone(), value.clone())
                    }
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[async_trait]
impl CadApi for HttpCadClient {
    async fn call_service(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<Option<CallServiceRecord>> {
        self.get_json(tenant, share, &format!("api/guest/{}/call-service/", share.id))
            .await
    }

    async fn geofence(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<Option<GeofenceSet>> {
        self.get_json(tenant, share, &format!("api/guest/{}/geofence/", share.id))
            .await
    }

    async fn update_location(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        update: &LocationUpdate,
    ) -> CadgateResult<bool> {
        let url = self.endpoint(tenant, &format!("api/guest/{}/location", share.id))?;
        let body = LocationRequestBody {
            token: share.token.expose(),
            latitude: update.latitude,
            longitude: update.longitude,
            accuracy: update.accuracy,
        };

        debug!(
            target: "cadgate::upstream",
            method = "POST",
            url = %url,
            tenant = %tenant,
            guest_share_id = share.id,
            body = %redact_body(&serde_json::to_value(&body)?),
            "CAD request"
        );

        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(successful(response, &url).is_some())
    }
}
