/// HTTP client for the vaccination/inventory API.
///
/// Synchronous `ureq` client bound to a configured base URL. Every
/// operation maps to one remote resource and decodes the JSON body into a
/// typed value. Authenticated calls carry `Authorization: Bearer <token>`
/// plus `Content-Type: application/json`; login and registration carry only
/// the content type.
///
/// Reads (GET) go through [`RetryPolicy`]; writes are attempted once.
/// Each call is appended to the [`ActivityLog`].
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub mod models;
pub mod retry;

use crate::activity::ActivityLog;
use crate::config::{ApiConfig, UploadEnvelope};
use crate::error::{Error, Result};

pub use models::{
    AuditLogEntry, GovSummary, InventoryItem, LoginBody, LoginRequest, LoginResponse,
    Registration, VaccinationRecord,
};
pub use retry::RetryPolicy;

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// The remote operations the view layer depends on.
///
/// [`ApiClient`] is the real implementation; tests substitute fakes.
pub trait Backend {
    /// Bearer token attached to authenticated calls (`None` sends none).
    fn set_bearer(&mut self, token: Option<String>);

    fn fetch_public_summary(&self) -> Result<Vec<VaccinationRecord>>;
    fn fetch_inventory_summary(&self) -> Result<Vec<InventoryItem>>;
    fn fetch_gov_summary(&self) -> Result<GovSummary>;
    fn fetch_audit_logs(&self) -> Result<Vec<AuditLogEntry>>;
    /// `record` must already be parsed JSON.
    fn upload_vaccination_record(&self, record: &Value) -> Result<Value>;
    fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;
    fn register(&self, registration: &Registration) -> Result<Value>;
    fn search_inventory(&self, keyword: &str) -> Result<Vec<InventoryItem>>;
    fn get_profile(&self) -> Result<Value>;
    fn update_profile(&self, fields: &Map<String, Value>) -> Result<Value>;
    fn get_identifiers(&self) -> Result<Value>;
    fn update_identifiers(&self, fields: &Map<String, Value>) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    bearer: Option<String>,
    retry: RetryPolicy,
    envelope: UploadEnvelope,
    activity: ActivityLog,
}

impl ApiClient {
    /// Build a client from the resolved `[api]` config. Activity logging is
    /// off until [`with_activity_log`](Self::with_activity_log) is called.
    pub fn from_config(config: &ApiConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer: None,
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_backoff_ms),
            ),
            envelope: config.upload_envelope,
            activity: ActivityLog::disabled(),
        }
    }

    pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
        self.activity = activity;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, request: ureq::Request, auth: Auth) -> ureq::Request {
        let request = request.set("Content-Type", "application/json");
        match (auth, &self.bearer) {
            (Auth::Bearer, Some(token)) => request.set("Authorization", &format!("Bearer {token}")),
            _ => request,
        }
    }

    /// GET with retry, decode, and log.
    fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path);
        let started = Instant::now();

        let (outcome, attempts) = self.retry.run(|| {
            let mut request = self.prepare(self.agent.get(&url), Auth::Bearer);
            for (name, value) in query {
                request = request.query(name, value);
            }
            send(request, None)
        });
        let outcome = outcome.and_then(|(status, body)| Ok((status, decode::<T>(&body)?)));

        self.activity
            .record(operation, "GET", path, &outcome, attempts, started.elapsed());
        outcome.map(|(_, value)| value)
    }

    /// POST once, decode, and log.
    fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: &Value,
        auth: Auth,
    ) -> Result<T> {
        let url = self.url(path);
        let started = Instant::now();

        let request = self.prepare(self.agent.post(&url), auth);
        let outcome = send(request, Some(body))
            .and_then(|(status, text)| Ok((status, decode::<T>(&text)?)));

        self.activity
            .record(operation, "POST", path, &outcome, 1, started.elapsed());
        outcome.map(|(_, value)| value)
    }

    fn upload_body(&self, record: &Value) -> Value {
        match self.envelope {
            UploadEnvelope::Raw => record.clone(),
            UploadEnvelope::Wrapped => serde_json::json!({ "vaccination_json": record }),
        }
    }
}

impl Backend for ApiClient {
    fn set_bearer(&mut self, token: Option<String>) {
        self.bearer = token.filter(|t| !t.is_empty());
    }

    fn fetch_public_summary(&self) -> Result<Vec<VaccinationRecord>> {
        self.get("fetch_public_summary", "/vaccinations/summary/public", &[])
    }

    fn fetch_inventory_summary(&self) -> Result<Vec<InventoryItem>> {
        self.get("fetch_inventory_summary", "/inventory/summary", &[])
    }

    fn fetch_gov_summary(&self) -> Result<GovSummary> {
        self.get("fetch_gov_summary", "/gov/dashboard-summary", &[])
    }

    fn fetch_audit_logs(&self) -> Result<Vec<AuditLogEntry>> {
        self.get("fetch_audit_logs", "/audit/logs", &[])
    }

    fn upload_vaccination_record(&self, record: &Value) -> Result<Value> {
        let body = self.upload_body(record);
        self.post("upload_vaccination_record", "/vaccinations/upload", &body, Auth::Bearer)
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = serde_json::to_value(LoginRequest { email, password })
            .map_err(|e| Error::validation(e.to_string()))?;
        self.post("login", "/auth/login", &body, Auth::Anonymous)
    }

    fn register(&self, registration: &Registration) -> Result<Value> {
        let body =
            serde_json::to_value(registration).map_err(|e| Error::validation(e.to_string()))?;
        self.post("register", "/auth/register", &body, Auth::Anonymous)
    }

    fn search_inventory(&self, keyword: &str) -> Result<Vec<InventoryItem>> {
        self.get("search_inventory", "/inventory/search", &[("query", keyword)])
    }

    fn get_profile(&self) -> Result<Value> {
        self.get("get_profile", "/profile", &[])
    }

    fn update_profile(&self, fields: &Map<String, Value>) -> Result<Value> {
        let body = Value::Object(fields.clone());
        self.post("update_profile", "/profile", &body, Auth::Bearer)
    }

    fn get_identifiers(&self) -> Result<Value> {
        self.get("get_identifiers", "/profile/identifiers", &[])
    }

    fn update_identifiers(&self, fields: &Map<String, Value>) -> Result<Value> {
        let body = Value::Object(fields.clone());
        self.post("update_identifiers", "/profile/identifiers", &body, Auth::Bearer)
    }
}

// ---------------------------------------------------------------------------
// Transport helpers
// ---------------------------------------------------------------------------

/// Send a prepared request and return `(status, body)` for 2xx responses.
fn send(request: ureq::Request, body: Option<&Value>) -> Result<(u16, String)> {
    let response = match body {
        Some(json) => request.send_json(json),
        None => request.call(),
    };

    match response {
        Ok(resp) => {
            let status = resp.status();
            let text = resp
                .into_string()
                .map_err(|e| Error::Network(format!("failed to read response body: {e}")))?;
            Ok((status, text))
        }
        Err(ureq::Error::Status(status, resp)) => {
            let message = resp.into_string().ok().and_then(|t| server_message(&t));
            Err(Error::Http { status, message })
        }
        Err(ureq::Error::Transport(transport)) => Err(Error::Network(transport.to_string())),
    }
}

/// Decode a response body. An empty body reads as JSON `null`.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))
}

/// Pull a human-readable message out of an error body
/// (`{"error": ...}` or `{"message": ...}`).
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
