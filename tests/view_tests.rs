/// View controller tests with a scripted backend and a recording renderer.
///
/// The fake backend counts every call so tests can assert that local
/// validation and the access guard stop a flow before the network.
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use vaxtrack::api::{
    AuditLogEntry, Backend, GovSummary, InventoryItem, LoginBody, LoginResponse, Registration,
    VaccinationRecord,
};
use vaxtrack::dashboard::{ChartInput, ChartKind, Table};
use vaxtrack::error::{Error, Result};
use vaxtrack::router::Page;
use vaxtrack::session::SessionStore;
use vaxtrack::view::upload::{NO_FILE, WRONG_TYPE};
use vaxtrack::view::{
    Notice, NoticeLevel, Outcome, RegistrationForm, Renderer, ViewController, ViewState,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Failure {
    Http(u16, Option<&'static str>),
    Network,
}

impl Failure {
    fn error(self) -> Error {
        match self {
            Self::Http(status, message) => Error::Http {
                status,
                message: message.map(str::to_string),
            },
            Self::Network => Error::Network("connection refused".to_string()),
        }
    }
}

#[derive(Default)]
struct FakeBackend {
    bearer: Option<String>,
    calls: RefCell<Vec<&'static str>>,
    failure: Option<Failure>,
    records: Vec<VaccinationRecord>,
    inventory: Vec<InventoryItem>,
    audit: Vec<AuditLogEntry>,
    login_response: LoginResponse,
}

impl FakeBackend {
    fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    fn call(&self, name: &'static str) -> Result<()> {
        self.calls.borrow_mut().push(name);
        match self.failure {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl Backend for FakeBackend {
    fn set_bearer(&mut self, token: Option<String>) {
        self.bearer = token;
    }

    fn fetch_public_summary(&self) -> Result<Vec<VaccinationRecord>> {
        self.call("fetch_public_summary")?;
        Ok(self.records.clone())
    }

    fn fetch_inventory_summary(&self) -> Result<Vec<InventoryItem>> {
        self.call("fetch_inventory_summary")?;
        Ok(self.inventory.clone())
    }

    fn fetch_gov_summary(&self) -> Result<GovSummary> {
        self.call("fetch_gov_summary")?;
        Ok(GovSummary {
            labels: vec!["North".to_string()],
            vaccinations: vec![10.0],
            ..GovSummary::default()
        })
    }

    fn fetch_audit_logs(&self) -> Result<Vec<AuditLogEntry>> {
        self.call("fetch_audit_logs")?;
        Ok(self.audit.clone())
    }

    fn upload_vaccination_record(&self, _record: &Value) -> Result<Value> {
        self.call("upload_vaccination_record")?;
        Ok(json!({"ok": true}))
    }

    fn login(&self, _email: &str, _password: &str) -> Result<LoginResponse> {
        self.call("login")?;
        Ok(self.login_response.clone())
    }

    fn register(&self, _registration: &Registration) -> Result<Value> {
        self.call("register")?;
        Ok(json!({"message": "created"}))
    }

    fn search_inventory(&self, _keyword: &str) -> Result<Vec<InventoryItem>> {
        self.call("search_inventory")?;
        Ok(self.inventory.clone())
    }

    fn get_profile(&self) -> Result<Value> {
        self.call("get_profile")?;
        Ok(json!({"first_name": "Ada"}))
    }

    fn update_profile(&self, fields: &Map<String, Value>) -> Result<Value> {
        self.call("update_profile")?;
        Ok(Value::Object(fields.clone()))
    }

    fn get_identifiers(&self) -> Result<Value> {
        self.call("get_identifiers")?;
        Ok(json!({"national_id": "X1"}))
    }

    fn update_identifiers(&self, fields: &Map<String, Value>) -> Result<Value> {
        self.call("update_identifiers")?;
        Ok(Value::Object(fields.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Heading(Page),
    Chart(ChartInput),
    Table(Table),
    Lines(Vec<String>),
    Record(Value),
    Notice(Notice),
    Redirect(Page),
}

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Event>,
}

impl Recorder {
    fn notices(&self) -> Vec<&Notice> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn notice_texts(&self) -> Vec<&str> {
        self.notices().iter().map(|n| n.text.as_str()).collect()
    }

    fn redirects(&self) -> Vec<Page> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Redirect(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn charts(&self) -> Vec<&ChartInput> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Chart(c) => Some(c),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for Recorder {
    fn heading(&mut self, page: Page) {
        self.events.push(Event::Heading(page));
    }

    fn chart(&mut self, chart: &ChartInput) {
        self.events.push(Event::Chart(chart.clone()));
    }

    fn table(&mut self, table: &Table) {
        self.events.push(Event::Table(table.clone()));
    }

    fn lines(&mut self, lines: &[String]) {
        self.events.push(Event::Lines(lines.to_vec()));
    }

    fn record(&mut self, value: &Value) {
        self.events.push(Event::Record(value.clone()));
    }

    fn notice(&mut self, notice: &Notice) {
        self.events.push(Event::Notice(notice.clone()));
    }

    fn redirect(&mut self, page: Page) {
        self.events.push(Event::Redirect(page));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Controller = ViewController<FakeBackend, Recorder>;

fn controller(backend: FakeBackend, session: SessionStore) -> Controller {
    ViewController::new(backend, session, Recorder::default())
}

fn signed_in(role: &str) -> SessionStore {
    let mut session = SessionStore::in_memory();
    session.save_login("T", role).unwrap();
    session
}

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vaxtrack-view-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = temp_path(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn record(dose: u32, name: &str, date: &str) -> VaccinationRecord {
    VaccinationRecord {
        dose_number: dose,
        vaccine_name: name.to_string(),
        date_administered: date.to_string(),
    }
}

fn login_response(token: &str, role: &str) -> LoginResponse {
    LoginResponse {
        body: Some(LoginBody {
            token: Some(token.to_string()),
            role: Some(role.to_string()),
        }),
        ..LoginResponse::default()
    }
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[test]
fn login_persists_session_then_redirects_to_role_dashboard() {
    let session_path = temp_path("login-session.json");
    let _ = std::fs::remove_file(&session_path);

    let backend = FakeBackend {
        login_response: login_response("T", "Merchant"),
        ..FakeBackend::default()
    };
    let mut view = controller(backend, SessionStore::open(&session_path));

    let outcome = view.login("ada@example.com", "secret");
    assert_eq!(outcome.redirect(), Some(Page::MerchantDashboard));
    assert_eq!(view.state(), ViewState::Ready);
    assert_eq!(view.session().token(), Some("T"));
    assert_eq!(view.session().raw_role(), Some("Merchant"));
    assert_eq!(view.backend().bearer.as_deref(), Some("T"));
    assert_eq!(view.renderer().redirects(), vec![Page::MerchantDashboard]);

    let reopened = SessionStore::open(&session_path);
    assert_eq!(reopened.token(), Some("T"));
    assert_eq!(reopened.raw_role(), Some("Merchant"));
}

#[test]
fn login_with_unknown_role_lands_on_login() {
    let backend = FakeBackend {
        login_response: login_response("T", "superuser"),
        ..FakeBackend::default()
    };
    let mut view = controller(backend, SessionStore::in_memory());

    assert_eq!(view.login("a@b.c", "pw").redirect(), Some(Page::Login));
}

#[test]
fn login_requires_email_and_password() {
    let mut view = controller(FakeBackend::default(), SessionStore::in_memory());

    let outcome = view.login("  ", "secret");
    assert!(outcome.is_failure());
    assert!(view.backend().calls().is_empty());
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["Email and password are required."]
    );

    let outcome = view.login("ada@example.com", "");
    assert!(outcome.is_failure());
    assert!(view.backend().calls().is_empty());
}

#[test]
fn login_without_credentials_shows_server_message() {
    let backend = FakeBackend {
        login_response: LoginResponse {
            error: Some("Invalid password".to_string()),
            ..LoginResponse::default()
        },
        ..FakeBackend::default()
    };
    let mut view = controller(backend, SessionStore::in_memory());

    let outcome = view.login("ada@example.com", "wrong");
    assert!(outcome.is_failure());
    assert_eq!(view.state(), ViewState::Error);
    assert_eq!(view.session().token(), None);
    assert_eq!(view.renderer().notice_texts(), vec!["Invalid password"]);
    assert!(view.renderer().redirects().is_empty());
}

#[test]
fn login_http_failure_falls_back_to_generic_message() {
    let mut view = controller(
        FakeBackend::failing(Failure::Http(401, None)),
        SessionStore::in_memory(),
    );

    view.login("ada@example.com", "wrong");
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["Login failed. Please check your credentials."]
    );

    let mut view = controller(
        FakeBackend::failing(Failure::Http(401, Some("Account locked"))),
        SessionStore::in_memory(),
    );
    view.login("ada@example.com", "wrong");
    assert_eq!(view.renderer().notice_texts(), vec!["Account locked"]);
}

#[test]
fn logout_clears_session_and_redirects() {
    let mut view = controller(FakeBackend::default(), signed_in("public"));

    assert_eq!(view.logout().redirect(), Some(Page::Login));
    assert_eq!(view.session().token(), None);
    assert_eq!(view.session().raw_role(), None);
    assert_eq!(view.backend().bearer, None);
    assert_eq!(view.state(), ViewState::Unauthenticated);
}

// ---------------------------------------------------------------------------
// Page activation
// ---------------------------------------------------------------------------

#[test]
fn public_dashboard_renders_three_charts_without_token() {
    let backend = FakeBackend {
        records: vec![
            record(1, "Pfizer", "2023-01-05"),
            record(2, "Pfizer", "2023-02-05"),
        ],
        ..FakeBackend::default()
    };
    let mut view = controller(backend, SessionStore::in_memory());

    let outcome = view.activate(Page::PublicDashboard);
    assert!(matches!(outcome, Outcome::Completed));
    assert_eq!(view.state(), ViewState::Ready);
    assert_eq!(view.backend().calls(), vec!["fetch_public_summary"]);

    let renderer = view.renderer();
    let charts = renderer.charts();
    assert_eq!(charts.len(), 3);

    assert_eq!(charts[0].kind, ChartKind::Bar);
    assert_eq!(charts[0].labels, vec!["Pfizer", "Pfizer"]);
    assert_eq!(charts[0].series, vec![1.0, 2.0]);

    assert_eq!(charts[1].kind, ChartKind::Pie);
    assert_eq!(charts[1].labels, vec!["Pfizer"]);
    assert_eq!(charts[1].series, vec![2.0]);

    assert_eq!(charts[2].kind, ChartKind::Line);
    assert_eq!(charts[2].labels, vec!["1/5/2023", "2/5/2023"]);
    assert_eq!(charts[2].series, vec![1.0, 2.0]);
}

#[test]
fn protected_page_without_token_redirects_without_fetching() {
    let mut session = SessionStore::in_memory();
    session.set("role", "merchant").unwrap();
    let mut view = controller(FakeBackend::default(), session);

    let outcome = view.activate(Page::MerchantDashboard);
    assert_eq!(outcome.redirect(), Some(Page::Login));
    assert_eq!(view.state(), ViewState::Unauthenticated);
    assert!(view.backend().calls().is_empty());
    assert_eq!(view.session().raw_role(), None);
    assert_eq!(view.renderer().redirects(), vec![Page::Login]);
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["You must be logged in to view this page."]
    );
    assert!(
        !view
            .renderer()
            .events
            .iter()
            .any(|e| matches!(e, Event::Heading(_)))
    );
}

#[test]
fn fetch_failure_leaves_error_state_with_notice() {
    let mut view = controller(
        FakeBackend::failing(Failure::Http(500, None)),
        SessionStore::in_memory(),
    );

    let outcome = view.activate(Page::PublicDashboard);
    assert!(matches!(outcome.error(), Some(Error::Http { status: 500, .. })));
    assert_eq!(view.state(), ViewState::Error);

    let notices = view.renderer().notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(
        notices[0]
            .text
            .starts_with("Error loading vaccination data. Please try again later.")
    );
    assert_eq!(view.renderer().events[0], Event::Heading(Page::PublicDashboard));
}

#[test]
fn merchant_dashboard_sends_bearer_and_charts_stock() {
    let backend = FakeBackend {
        inventory: vec![InventoryItem {
            item_type: "Mask".to_string(),
            item_subtype: "N95".to_string(),
            quantity: 12,
        }],
        ..FakeBackend::default()
    };
    let mut view = controller(backend, signed_in("merchant"));

    view.activate(Page::MerchantDashboard);
    assert_eq!(view.backend().bearer.as_deref(), Some("T"));

    let charts = view.renderer().charts();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].labels, vec!["Mask - N95"]);
    assert_eq!(charts[0].series, vec![12.0]);
}

#[test]
fn audit_page_renders_table() {
    let backend = FakeBackend {
        audit: vec![AuditLogEntry {
            user_email: "gov@example.com".to_string(),
            role: "government".to_string(),
            action: "LOGIN".to_string(),
            timestamp: "2023-01-05".to_string(),
        }],
        ..FakeBackend::default()
    };
    let mut view = controller(backend, signed_in("government"));

    view.activate(Page::AdminReports);
    let table = view
        .renderer()
        .events
        .iter()
        .find_map(|e| match e {
            Event::Table(t) => Some(t.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(table.headers, vec!["Email", "Role", "Action", "Time"]);
    assert_eq!(table.rows[0][0], "gov@example.com");
    assert_eq!(table.rows[0][3], "1/5/2023, 12:00:00 AM");
}

#[test]
fn role_landing_shows_label_and_destination() {
    let mut view = controller(FakeBackend::default(), signed_in("government"));

    view.activate(Page::RoleLanding);
    assert!(view.backend().calls().is_empty());
    assert!(view.renderer().events.contains(&Event::Record(json!({
        "role": "Government",
        "dashboard": "gov-dashboard",
    }))));
}

#[test]
fn role_landing_without_stored_role_says_unknown() {
    let mut session = SessionStore::in_memory();
    session.set("token", "T").unwrap();
    let mut view = controller(FakeBackend::default(), session);

    view.activate(Page::RoleLanding);
    assert!(view.renderer().events.contains(&Event::Record(json!({
        "role": "Unknown",
        "dashboard": "login",
    }))));
}

#[test]
fn activate_home_follows_session_role() {
    let mut view = controller(FakeBackend::default(), signed_in("government"));
    view.activate_home();
    assert_eq!(view.page(), Some(Page::GovDashboard));
    assert_eq!(view.backend().calls(), vec!["fetch_gov_summary"]);

    let mut view = controller(FakeBackend::default(), SessionStore::in_memory());
    view.activate_home();
    assert_eq!(view.page(), Some(Page::Login));
    assert!(view.backend().calls().is_empty());
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[test]
fn upload_requires_login() {
    let mut view = controller(FakeBackend::default(), SessionStore::in_memory());
    let path = temp_file("needs-login.json", "{}");

    assert_eq!(view.upload(&path).redirect(), Some(Page::Login));
    assert!(view.backend().calls().is_empty());
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["You must be logged in to upload vaccination records."]
    );
}

#[test]
fn upload_rejects_wrong_extension_before_any_call() {
    let mut view = controller(FakeBackend::default(), signed_in("public"));
    let path = temp_file("record.txt", r#"{"dose_number":1}"#);

    assert!(view.upload(&path).is_failure());
    assert!(view.backend().calls().is_empty());
    assert_eq!(view.renderer().notice_texts(), vec![WRONG_TYPE]);
}

#[test]
fn upload_rejects_missing_file_and_invalid_json() {
    let mut view = controller(FakeBackend::default(), signed_in("public"));

    assert!(view.upload(Path::new("")).is_failure());
    let broken = temp_file("broken.json", "{ nope");
    assert!(view.upload(&broken).is_failure());

    assert!(view.backend().calls().is_empty());
    let texts = view.renderer().notice_texts();
    assert_eq!(texts[0], NO_FILE);
    assert!(texts[1].starts_with("The selected file is not valid JSON"));
}

#[test]
fn valid_upload_calls_api_once() {
    let mut view = controller(FakeBackend::default(), signed_in("public"));
    let path = temp_file(
        "valid.json",
        r#"{"dose_number":1,"vaccine_name":"Pfizer","date_administered":"2023-01-05"}"#,
    );

    assert!(matches!(view.upload(&path), Outcome::Completed));
    assert_eq!(view.backend().calls(), vec!["upload_vaccination_record"]);
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["Vaccination record uploaded successfully!"]
    );
}

#[test]
fn upload_failure_is_reported_inline() {
    let mut view = controller(
        FakeBackend::failing(Failure::Http(500, None)),
        signed_in("public"),
    );
    let path = temp_file("fails.json", "{}");

    assert!(view.upload(&path).is_failure());
    assert_eq!(view.state(), ViewState::Error);
    assert_eq!(view.renderer().notice_texts(), vec!["Upload failed: HTTP 500"]);
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn form() -> RegistrationForm {
    RegistrationForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: "secret".to_string(),
        confirm_password: "secret".to_string(),
        desired_role: Some("public".to_string()),
        ..RegistrationForm::default()
    }
}

#[test]
fn registration_validation_never_calls_api() {
    let mut view = controller(FakeBackend::default(), SessionStore::in_memory());

    let mut mismatched = form();
    mismatched.confirm_password = "other".to_string();
    assert!(view.register(&mismatched).is_failure());

    let mut no_role = form();
    no_role.desired_role = None;
    assert!(view.register(&no_role).is_failure());

    assert!(view.backend().calls().is_empty());
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["Passwords do not match.", "Please select a role."]
    );
}

#[test]
fn registration_success_redirects_to_login() {
    let mut view = controller(FakeBackend::default(), SessionStore::in_memory());

    assert_eq!(view.register(&form()).redirect(), Some(Page::Login));
    assert_eq!(view.backend().calls(), vec!["register"]);
    assert_eq!(view.renderer().notice_texts(), vec!["Registration successful!"]);
}

#[test]
fn registration_failures_pick_message_by_kind() {
    let mut view = controller(
        FakeBackend::failing(Failure::Http(409, Some("Email already registered"))),
        SessionStore::in_memory(),
    );
    view.register(&form());
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["Email already registered"]
    );

    let mut view = controller(
        FakeBackend::failing(Failure::Http(400, None)),
        SessionStore::in_memory(),
    );
    view.register(&form());
    assert_eq!(view.renderer().notice_texts(), vec!["Registration failed."]);

    let mut view = controller(
        FakeBackend::failing(Failure::Network),
        SessionStore::in_memory(),
    );
    view.register(&form());
    assert_eq!(
        view.renderer().notice_texts(),
        vec!["Server error. Please try again later."]
    );
}

// ---------------------------------------------------------------------------
// Search and profile
// ---------------------------------------------------------------------------

#[test]
fn search_lists_matching_items() {
    let backend = FakeBackend {
        inventory: vec![InventoryItem {
            item_type: "Mask".to_string(),
            item_subtype: "N95".to_string(),
            quantity: 4,
        }],
        ..FakeBackend::default()
    };
    let mut view = controller(backend, signed_in("merchant"));

    assert!(matches!(view.search("mask"), Outcome::Completed));
    assert!(
        view.renderer()
            .events
            .contains(&Event::Lines(vec!["Mask - N95 (Qty: 4)".to_string()]))
    );
}

#[test]
fn empty_profile_update_is_rejected_locally() {
    let mut view = controller(FakeBackend::default(), signed_in("public"));

    assert!(view.update_profile(&Map::new()).is_failure());
    assert!(view.backend().calls().is_empty());
    assert_eq!(view.renderer().notice_texts(), vec!["Nothing to update."]);
}

#[test]
fn identifiers_update_renders_result() {
    let mut view = controller(FakeBackend::default(), signed_in("public"));
    let mut fields = Map::new();
    fields.insert("national_id".to_string(), json!("X2"));

    assert!(matches!(view.update_identifiers(&fields), Outcome::Completed));
    assert_eq!(view.backend().calls(), vec!["update_identifiers"]);
    assert!(
        view.renderer()
            .events
            .contains(&Event::Record(json!({"national_id": "X2"})))
    );
}
