/// Pages the view controller can activate.
///
/// Each page has a stable id (used on the command line), the route it was
/// served under, and a display title. Pages can be identified from any of
/// the three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    Register,
    PublicDashboard,
    MerchantDashboard,
    GovDashboard,
    AdminReports,
    UploadVaccine,
    InventorySearch,
    Profile,
    Identifiers,
    RoleLanding,
}

impl Page {
    pub const ALL: [Page; 11] = [
        Page::Login,
        Page::Register,
        Page::PublicDashboard,
        Page::MerchantDashboard,
        Page::GovDashboard,
        Page::AdminReports,
        Page::UploadVaccine,
        Page::InventorySearch,
        Page::Profile,
        Page::Identifiers,
        Page::RoleLanding,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::PublicDashboard => "public-dashboard",
            Self::MerchantDashboard => "merchant-dashboard",
            Self::GovDashboard => "gov-dashboard",
            Self::AdminReports => "admin-reports",
            Self::UploadVaccine => "upload-vaccine",
            Self::InventorySearch => "inventory-search",
            Self::Profile => "profile",
            Self::Identifiers => "identifiers",
            Self::RoleLanding => "dashboard",
        }
    }

    pub fn route(self) -> String {
        format!("{}.html", self.id())
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
            Self::PublicDashboard => "Public Dashboard",
            Self::MerchantDashboard => "Merchant Dashboard",
            Self::GovDashboard => "Government Dashboard",
            Self::AdminReports => "Admin Reports",
            Self::UploadVaccine => "Upload Vaccination Record",
            Self::InventorySearch => "Inventory Search",
            Self::Profile => "Profile",
            Self::Identifiers => "Identifiers",
            Self::RoleLanding => "My Dashboard",
        }
    }

    /// Pages that need a token. Everything else is open.
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login | Self::Register | Self::PublicDashboard)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        let id = match id.as_str() {
            "government-dashboard" => "gov-dashboard",
            "audit" | "reports" => "admin-reports",
            "upload" => "upload-vaccine",
            "search" => "inventory-search",
            other => other,
        };
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Match the last path segment, with or without `.html`.
    pub fn from_route(route: &str) -> Option<Self> {
        let segment = route
            .split(['?', '#'])
            .next()
            .unwrap_or(route)
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(route);
        let stem = segment.strip_suffix(".html").unwrap_or(segment);
        if stem.is_empty() {
            return None;
        }
        Self::from_id(stem)
    }

    /// Case-insensitive substring match on a page title.
    pub fn from_title(title: &str) -> Option<Self> {
        let title = title.to_ascii_lowercase();
        const PATTERNS: [(&str, Page); 10] = [
            ("public dashboard", Page::PublicDashboard),
            ("merchant dashboard", Page::MerchantDashboard),
            ("government dashboard", Page::GovDashboard),
            ("admin reports", Page::AdminReports),
            ("upload", Page::UploadVaccine),
            ("inventory search", Page::InventorySearch),
            ("identifiers", Page::Identifiers),
            ("profile", Page::Profile),
            ("register", Page::Register),
            ("login", Page::Login),
        ];
        PATTERNS
            .iter()
            .find(|(pattern, _)| title.contains(pattern))
            .map(|(_, page)| *page)
    }

    /// Try id, then route, then title.
    pub fn resolve(input: &str) -> Option<Self> {
        Self::from_id(input)
            .or_else(|| Self::from_route(input))
            .or_else(|| Self::from_title(input))
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
