/// Role router: where a session lands and which pages it may open.
///
/// Both functions are total. `destination_for` covers every role including
/// `Unknown`; `guard` only looks at token presence, the remote API enforces
/// anything finer.
mod page;

pub use page::Page;

use crate::session::{Role, Session};

/// Outcome of the access check for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Abort the page and go here instead.
    Redirect(Page),
}

/// Landing page for a role.
pub fn destination_for(role: Role) -> Page {
    match role {
        Role::Public => Page::PublicDashboard,
        Role::Merchant => Page::MerchantDashboard,
        Role::GovernmentOfficial => Page::GovDashboard,
        Role::Unknown => Page::Login,
    }
}

/// Landing page for a session; no token always lands on login.
pub fn destination_for_session(session: &Session) -> Page {
    if session.is_authenticated() {
        destination_for(session.role)
    } else {
        Page::Login
    }
}

pub fn guard(page: Page, session: &Session) -> Access {
    if page.is_protected() && !session.is_authenticated() {
        Access::Redirect(Page::Login)
    } else {
        Access::Allow
    }
}
