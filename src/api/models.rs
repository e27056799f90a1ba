//! Wire types for the vaccination/inventory API.
use serde::{Deserialize, Deserializer, Serialize};

/// One administered dose, as listed by `GET /vaccinations/summary/public`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    #[serde(deserialize_with = "dose_number")]
    pub dose_number: u32,
    pub vaccine_name: String,
    /// `YYYY-MM-DD` or an ISO-8601 datetime, kept as sent.
    pub date_administered: String,
}

fn dose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = u32::deserialize(deserializer)?;
    if n == 0 {
        return Err(serde::de::Error::custom("dose_number must be at least 1"));
    }
    Ok(n)
}

/// A stock row from `GET /inventory/summary` or `/inventory/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_type: String,
    pub item_subtype: String,
    pub quantity: u64,
}

impl InventoryItem {
    /// `"{item_type} - {item_subtype}"`, the chart/listing label.
    pub fn label(&self) -> String {
        format!("{} - {}", self.item_type, self.item_subtype)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub user_email: String,
    pub role: String,
    pub action: String,
    pub timestamp: String,
}

/// Pre-aggregated government dashboard figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GovSummary {
    pub labels: Vec<String>,
    pub vaccinations: Vec<f64>,
    pub vaccine_types: Vec<String>,
    pub vaccine_counts: Vec<f64>,
    pub months: Vec<String>,
    pub trend: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /auth/login` answers `{"body": {"token": ..., "role": ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub body: Option<LoginBody>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl LoginResponse {
    /// Token and role, only when both are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let body = self.body.as_ref()?;
        let token = body.token.as_deref().filter(|t| !t.is_empty())?;
        let role = body.role.as_deref().filter(|r| !r.is_empty())?;
        Some((token, role))
    }

    /// Explanation the server gave alongside a response without credentials.
    pub fn server_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub mobile_phone: String,
    pub home_address: String,
    pub desired_role: String,
}
