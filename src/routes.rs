// src/routes.rs — Auth-gated routing decisions
//
// Protected views must not fetch anything until the session has been
// restored. The guard is the single place that decides between showing
// a placeholder, redirecting, or rendering.

use crate::session::{SessionStatus, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    /// Landing page after a payment provider redirect.
    PaymentComplete,
    Dashboard,
    Memories,
    Friends,
    Voices,
    Alarms,
    Payments,
    Profile,
    Admin,
}

impl Route {
    pub fn is_public(self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    pub fn requires_admin(self) -> bool {
        matches!(self, Route::Admin)
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::PaymentComplete => "/payment/complete",
            Route::Dashboard => "/dashboard",
            Route::Memories => "/memories",
            Route::Friends => "/friends",
            Route::Voices => "/voices",
            Route::Alarms => "/alarms",
            Route::Payments => "/payments",
            Route::Profile => "/profile",
            Route::Admin => "/admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session not restored yet: render a placeholder, fetch nothing.
    Loading,
    RedirectToLogin,
    /// Logged in but not allowed here.
    RedirectToHome,
    Render,
}

pub fn guard(route: Route, session: &SessionStore) -> RouteDecision {
    decide(
        route,
        session.status(),
        session.is_logged_in(),
        session.is_admin(),
    )
}

fn decide(route: Route, status: SessionStatus, logged_in: bool, admin: bool) -> RouteDecision {
    if route.is_public() {
        return RouteDecision::Render;
    }
    if status != SessionStatus::Ready {
        return RouteDecision::Loading;
    }
    if !logged_in {
        return RouteDecision::RedirectToLogin;
    }
    if route.requires_admin() && !admin {
        return RouteDecision::RedirectToHome;
    }
    RouteDecision::Render
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes_always_render() {
        for status in [
            SessionStatus::Uninitialized,
            SessionStatus::Restoring,
            SessionStatus::Ready,
        ] {
            assert_eq!(decide(Route::Login, status, false, false), RouteDecision::Render);
            assert_eq!(decide(Route::Register, status, false, false), RouteDecision::Render);
        }
    }

    #[test]
    fn test_protected_route_waits_for_restore() {
        assert_eq!(
            decide(Route::Dashboard, SessionStatus::Uninitialized, false, false),
            RouteDecision::Loading
        );
        // Even with a user in memory, nothing renders before Ready
        assert_eq!(
            decide(Route::Dashboard, SessionStatus::Restoring, true, false),
            RouteDecision::Loading
        );
    }

    #[test]
    fn test_protected_route_redirects_without_user() {
        assert_eq!(
            decide(Route::Memories, SessionStatus::Ready, false, false),
            RouteDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_admin_route() {
        assert_eq!(
            decide(Route::Admin, SessionStatus::Ready, true, false),
            RouteDecision::RedirectToHome
        );
        assert_eq!(
            decide(Route::Admin, SessionStatus::Ready, true, true),
            RouteDecision::Render
        );
    }

    #[test]
    fn test_payment_complete_is_protected() {
        assert!(!Route::PaymentComplete.is_public());
        assert_eq!(Route::PaymentComplete.path(), "/payment/complete");
    }
}
