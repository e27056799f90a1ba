//! View controller: page activation and the interactive flows.
//!
//! Every activation walks the same state machine:
//!
//! ```text
//! Unauthenticated ──guard fails──▶ redirect(login)        (terminal)
//!        │
//!        └──guard ok──▶ Loading ──fetch+adapt ok──▶ Ready
//!                           └────────failure──────▶ Error  (inline notice)
//! ```
//!
//! Errors never escape: each method renders what went wrong and returns an
//! [`Outcome`] so the caller can decide what to do next (follow a redirect,
//! set an exit code).

pub mod render;
pub mod upload;

use std::path::Path;

use serde_json::{Map, Value};

use crate::api::{Backend, Registration};
use crate::dashboard::{self, DashboardCharts};
use crate::error::Error;
use crate::router::{self, Access, Page};
use crate::session::{Role, SessionStore, role_label};

pub use render::{Notice, NoticeLevel, OutputFormat, Renderer, TerminalRenderer};

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const REGISTRATION_FAILED: &str = "Registration failed.";
const SERVER_ERROR: &str = "Server error. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Unauthenticated,
    Loading,
    Ready,
    Error,
}

#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// Navigation continues on another page.
    Redirected(Page),
    /// The error was already rendered.
    Failed(Error),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn redirect(&self) -> Option<Page> {
        match self {
            Self::Redirected(page) => Some(*page),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Registration form as entered, before trimming and validation.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_phone: String,
    pub password: String,
    pub confirm_password: String,
    pub home_address: String,
    pub desired_role: Option<String>,
}

impl RegistrationForm {
    /// Normalize the fields and check them, in the order a user would fix
    /// them: required fields, password confirmation, role.
    pub fn validate(&self) -> Result<Registration, Error> {
        let registration = Registration {
            first_name: self.first_name.trim().to_string(),
            middle_name: self.middle_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.clone(),
            mobile_phone: self.mobile_phone.trim().to_string(),
            home_address: self.home_address.trim().to_string(),
            desired_role: self
                .desired_role
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        };

        let required = [
            ("First name", &registration.first_name),
            ("Last name", &registration.last_name),
            ("Email", &registration.email),
            ("Password", &registration.password),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(Error::validation(format!("{field} is required.")));
        }
        if self.password != self.confirm_password {
            return Err(Error::validation("Passwords do not match."));
        }
        if registration.desired_role.is_empty() {
            return Err(Error::validation("Please select a role."));
        }

        Ok(registration)
    }
}

pub struct ViewController<B, R> {
    backend: B,
    session: SessionStore,
    renderer: R,
    state: ViewState,
    page: Option<Page>,
}

impl<B: Backend, R: Renderer> ViewController<B, R> {
    pub fn new(backend: B, session: SessionStore, renderer: R) -> Self {
        Self {
            backend,
            session,
            renderer,
            state: ViewState::Unauthenticated,
            page: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    // -----------------------------------------------------------------------
    // Page activation
    // -----------------------------------------------------------------------

    /// Activate `page`: guard, fetch what it shows, render.
    pub fn activate(&mut self, page: Page) -> Outcome {
        if let Some(redirected) = self.begin(page) {
            return redirected;
        }

        self.renderer.heading(page);
        match self.load(page) {
            Ok(()) => self.ready(),
            Err(e) => {
                let message = format!("{} ({e})", load_failure_message(page));
                self.fail(e, message)
            }
        }
    }

    /// Activate the landing page for the current session.
    pub fn activate_home(&mut self) -> Outcome {
        let page = router::destination_for_session(&self.session.session());
        self.activate(page)
    }

    fn load(&mut self, page: Page) -> Result<(), Error> {
        match page {
            Page::PublicDashboard => {
                let records = self.backend.fetch_public_summary()?;
                self.draw(&dashboard::public_charts(&records));
            }
            Page::MerchantDashboard => {
                let items = self.backend.fetch_inventory_summary()?;
                self.draw(&dashboard::merchant_charts(&items));
            }
            Page::GovDashboard => {
                let summary = self.backend.fetch_gov_summary()?;
                self.draw(&dashboard::gov_charts(&summary));
            }
            Page::AdminReports => {
                let entries = self.backend.fetch_audit_logs()?;
                self.renderer.table(&dashboard::audit_table(&entries));
            }
            Page::Profile => {
                let profile = self.backend.get_profile()?;
                self.renderer.record(&profile);
            }
            Page::Identifiers => {
                let identifiers = self.backend.get_identifiers()?;
                self.renderer.record(&identifiers);
            }
            Page::RoleLanding => {
                let raw = self.session.raw_role();
                let label = raw.map_or_else(|| Role::Unknown.to_string(), role_label);
                let destination = router::destination_for(Role::from_optional(raw));
                self.renderer.record(&serde_json::json!({
                    "role": label,
                    "dashboard": destination.id(),
                }));
            }
            Page::Login | Page::Register | Page::UploadVaccine | Page::InventorySearch => {}
        }
        Ok(())
    }

    fn draw(&mut self, charts: &DashboardCharts) {
        for chart in charts.iter() {
            self.renderer.chart(chart);
        }
    }

    // -----------------------------------------------------------------------
    // Session flows
    // -----------------------------------------------------------------------

    /// Log in, persist the session, then hand back the role's dashboard.
    pub fn login(&mut self, email: &str, password: &str) -> Outcome {
        if let Some(redirected) = self.begin(Page::Login) {
            return redirected;
        }

        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return self.fail_plain(Error::validation("Email and password are required."));
        }

        let response = match self.backend.login(email, password) {
            Ok(response) => response,
            Err(e) => {
                let message = e.server_message().unwrap_or(LOGIN_FAILED).to_string();
                return self.fail(e, message);
            }
        };

        let Some((token, role)) = response.credentials() else {
            let message = response.server_message().unwrap_or(LOGIN_FAILED).to_string();
            return self.fail(
                Error::Decode("login response is missing token or role".to_string()),
                message,
            );
        };

        if let Err(e) = self.session.save_login(token, role) {
            let message = format!("Could not save the session: {e}");
            return self.fail(e, message);
        }
        self.backend.set_bearer(Some(token.to_string()));

        let destination = router::destination_for(Role::parse(role));
        self.state = ViewState::Ready;
        self.renderer
            .notice(&Notice::success(format!("Logged in as {}.", role_label(role))));
        self.renderer.redirect(destination);
        Outcome::Redirected(destination)
    }

    pub fn logout(&mut self) -> Outcome {
        self.page = Some(Page::Login);
        self.backend.set_bearer(None);
        if let Err(e) = self.session.clear() {
            let message = format!("Could not clear the session: {e}");
            return self.fail(e, message);
        }

        self.state = ViewState::Unauthenticated;
        self.renderer.notice(&Notice::info("Logged out."));
        self.renderer.redirect(Page::Login);
        Outcome::Redirected(Page::Login)
    }

    pub fn register(&mut self, form: &RegistrationForm) -> Outcome {
        if let Some(redirected) = self.begin(Page::Register) {
            return redirected;
        }

        let registration = match form.validate() {
            Ok(registration) => registration,
            Err(e) => return self.fail_plain(e),
        };

        match self.backend.register(&registration) {
            Ok(_) => {
                self.state = ViewState::Ready;
                self.renderer
                    .notice(&Notice::success("Registration successful!"));
                self.renderer.redirect(Page::Login);
                Outcome::Redirected(Page::Login)
            }
            Err(e @ Error::Http { .. }) => {
                let message = e.server_message().unwrap_or(REGISTRATION_FAILED).to_string();
                self.fail(e, message)
            }
            Err(e) => self.fail(e, SERVER_ERROR.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Page actions
    // -----------------------------------------------------------------------

    /// Validate the file locally, then upload it. Nothing reaches the API
    /// unless the file is a readable `.json` file that parses.
    pub fn upload(&mut self, path: &Path) -> Outcome {
        if let Some(redirected) = self.begin(Page::UploadVaccine) {
            return redirected;
        }

        let record = match upload::load_upload(path) {
            Ok(record) => record,
            Err(e) => return self.fail_plain(e),
        };

        match self.backend.upload_vaccination_record(&record) {
            Ok(_) => {
                self.renderer
                    .notice(&Notice::success("Vaccination record uploaded successfully!"));
                self.ready()
            }
            Err(e) => {
                let message = format!("Upload failed: {e}");
                self.fail(e, message)
            }
        }
    }

    pub fn search(&mut self, keyword: &str) -> Outcome {
        if let Some(redirected) = self.begin(Page::InventorySearch) {
            return redirected;
        }

        match self.backend.search_inventory(keyword.trim()) {
            Ok(items) => {
                self.renderer.lines(&dashboard::inventory_lines(&items));
                self.ready()
            }
            Err(e) => {
                let message = format!("Search failed: {e}");
                self.fail(e, message)
            }
        }
    }

    pub fn update_profile(&mut self, fields: &Map<String, Value>) -> Outcome {
        self.update(Page::Profile, fields)
    }

    pub fn update_identifiers(&mut self, fields: &Map<String, Value>) -> Outcome {
        self.update(Page::Identifiers, fields)
    }

    fn update(&mut self, page: Page, fields: &Map<String, Value>) -> Outcome {
        if let Some(redirected) = self.begin(page) {
            return redirected;
        }
        if fields.is_empty() {
            return self.fail_plain(Error::validation("Nothing to update."));
        }

        let result = match page {
            Page::Identifiers => self.backend.update_identifiers(fields),
            _ => self.backend.update_profile(fields),
        };

        match result {
            Ok(updated) => {
                self.renderer
                    .notice(&Notice::success(format!("{} updated.", page.title())));
                if updated.is_object() {
                    self.renderer.record(&updated);
                }
                self.ready()
            }
            Err(e) => {
                let message = format!("Update failed: {e}");
                self.fail(e, message)
            }
        }
    }

    // -----------------------------------------------------------------------
    // State transitions
    // -----------------------------------------------------------------------

    /// Enter `page`: run the guard and move to `Loading`, or redirect.
    fn begin(&mut self, page: Page) -> Option<Outcome> {
        self.page = Some(page);
        self.state = ViewState::Unauthenticated;

        let session = self.session.session();
        match router::guard(page, &session) {
            Access::Allow => {
                self.backend.set_bearer(session.token);
                self.state = ViewState::Loading;
                None
            }
            Access::Redirect(target) => {
                self.backend.set_bearer(None);
                if let Err(e) = self.session.clear() {
                    self.renderer.notice(&Notice::error(format!(
                        "Could not clear the session: {e}"
                    )));
                }
                self.renderer
                    .notice(&Notice::error(login_required_message(page)));
                self.renderer.redirect(target);
                Some(Outcome::Redirected(target))
            }
        }
    }

    fn ready(&mut self) -> Outcome {
        self.state = ViewState::Ready;
        Outcome::Completed
    }

    fn fail(&mut self, error: Error, message: String) -> Outcome {
        self.state = ViewState::Error;
        self.renderer.notice(&Notice::error(message));
        Outcome::Failed(error)
    }

    /// Fail with the error's own text as the message.
    fn fail_plain(&mut self, error: Error) -> Outcome {
        let message = error.to_string();
        self.fail(error, message)
    }
}

fn login_required_message(page: Page) -> &'static str {
    match page {
        Page::UploadVaccine => "You must be logged in to upload vaccination records.",
        _ => "You must be logged in to view this page.",
    }
}

fn load_failure_message(page: Page) -> &'static str {
    match page {
        Page::PublicDashboard => "Error loading vaccination data. Please try again later.",
        Page::MerchantDashboard => "Error loading inventory data. Please try again later.",
        Page::GovDashboard => "Error loading dashboard data. Please try again later.",
        Page::AdminReports => "Error loading audit logs. Please try again later.",
        Page::Profile => "Error loading your profile. Please try again later.",
        Page::Identifiers => "Error loading your identifiers. Please try again later.",
        _ => "Error loading this page. Please try again later.",
    }
}
