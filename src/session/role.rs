use serde::{Deserialize, Serialize};

/// User category that decides which dashboard a session lands on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Public,
    Merchant,
    GovernmentOfficial,
    #[default]
    Unknown,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Public,
        Role::Merchant,
        Role::GovernmentOfficial,
        Role::Unknown,
    ];

    /// Parse a role as stored or returned by the server. Never fails:
    /// anything unrecognised is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "public" => Self::Public,
            "merchant" => Self::Merchant,
            "government" | "gov" | "governmentofficial" => Self::GovernmentOfficial,
            _ => Self::Unknown,
        }
    }

    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "Public"),
            Self::Merchant => write!(f, "Merchant"),
            Self::GovernmentOfficial => write!(f, "Government Official"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// `"merchant"` → `"Merchant"`, the label shown next to the session role.
pub fn role_label(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
