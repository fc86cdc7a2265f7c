//! Deciding whether a page may be shown, based on the current session.
//!
//! The guard never talks to the network and never fails. Anything it doesn't
//! like turns into a silent redirect.

use crate::{
    layout::{Chrome, MenuAction},
    Role, Session, SessionStore,
};

pub const LOGIN_PATH: &str = "/login";

/// Every page the app knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    ResetPassword,
    DoctorDashboard,
    DoctorAppointments,
    DoctorPatients,
    PatientDashboard,
    PatientAppointments,
    PatientProfile,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Root,
        Route::Login,
        Route::Register,
        Route::ResetPassword,
        Route::DoctorDashboard,
        Route::DoctorAppointments,
        Route::DoctorPatients,
        Route::PatientDashboard,
        Route::PatientAppointments,
        Route::PatientProfile,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => LOGIN_PATH,
            Route::Register => "/register",
            Route::ResetPassword => "/reset-password",
            Route::DoctorDashboard => "/doctor/dashboard",
            Route::DoctorAppointments => "/doctor/appointments",
            Route::DoctorPatients => "/doctor/patients",
            Route::PatientDashboard => "/patient/dashboard",
            Route::PatientAppointments => "/patient/appointments",
            Route::PatientProfile => "/patient/profile",
        }
    }

    /// Look up a route, ignoring any query string, fragment, or trailing
    /// slash.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(&['?', '#'][..]).next().unwrap_or("");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        Route::ALL.iter().copied().find(|route| route.path() == path)
    }

    /// Who is allowed to see this page, if it's protected at all.
    pub fn required_role(self) -> Option<Role> {
        match self {
            Route::DoctorDashboard
            | Route::DoctorAppointments
            | Route::DoctorPatients => Some(Role::Doctor),
            Route::PatientDashboard
            | Route::PatientAppointments
            | Route::PatientProfile => Some(Role::Patient),
            Route::Root
            | Route::Login
            | Route::Register
            | Route::ResetPassword => None,
        }
    }
}

/// Where a session stands relative to a protected page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    /// Logged in, but as somebody else. Carries the stored role.
    WrongRole(Role),
    /// A token without the rest of the session to go with it.
    Inconsistent,
    Authorized,
}

/// Classify a session, checking (in order) the token, the role, then the
/// user. The first failing check wins.
///
/// A token with no usable role can't be sent to any dashboard, so it is
/// reported as [`GuardState::Inconsistent`] at the role check.
pub fn evaluate(session: &Session, required: Role) -> GuardState {
    if !session.is_authenticated() {
        return GuardState::Unauthenticated;
    }

    match session.role {
        None => return GuardState::Inconsistent,
        Some(stored) if stored != required => {
            return GuardState::WrongRole(stored)
        },
        Some(_) => {},
    }

    if session.user.is_none() {
        return GuardState::Inconsistent;
    }

    GuardState::Authorized
}

/// The outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin {
        /// Where the user was trying to go, so they can be sent back
        /// after logging in.
        from: Option<String>,
    },
    RedirectToDashboard {
        role: Role,
        from: String,
    },
}

impl Decision {
    /// Where to redirect to, if anywhere.
    pub fn target(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectToLogin { .. } => Some(LOGIN_PATH),
            Decision::RedirectToDashboard { role, .. } => {
                Some(role.dashboard_path())
            },
        }
    }
}

/// What the app should do with a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Show the page. Protected pages come wrapped in a [`Chrome`].
    Render {
        route: Route,
        chrome: Option<Chrome>,
    },
    Redirect(Decision),
    NotFound(String),
}

/// Checks navigation attempts against a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    store: SessionStore,
}

impl RouteGuard {
    pub fn new(store: SessionStore) -> Self { RouteGuard { store } }

    /// May the current session see `path`, which needs `required`?
    ///
    /// An inconsistent session is logged out on the spot.
    pub fn check(&self, path: &str, required: Role) -> Decision {
        let session = self.store.read().unwrap_or_else(|e| {
            log::warn!("Unable to read the session, assuming nobody: {}", e);
            Session::default()
        });

        let decision = match evaluate(&session, required) {
            GuardState::Unauthenticated => Decision::RedirectToLogin {
                from: Some(path.to_string()),
            },
            GuardState::WrongRole(stored) => Decision::RedirectToDashboard {
                role: stored,
                from: path.to_string(),
            },
            GuardState::Inconsistent => {
                log::warn!("Found a corrupted session, logging out");

                if let Err(e) = self.store.clear() {
                    log::warn!("Unable to clear the session: {}", e);
                }

                Decision::RedirectToLogin {
                    from: Some(path.to_string()),
                }
            },
            GuardState::Authorized => Decision::Allow,
        };

        if let Some(target) = decision.target() {
            log::debug!("Redirecting from {} to {}", path, target);
        }

        decision
    }

    /// Route a path through the app, guarding protected pages.
    pub fn navigate(&self, path: &str) -> Navigation {
        let route = match Route::parse(path) {
            Some(route) => route,
            None => return Navigation::NotFound(path.to_string()),
        };

        if route == Route::Root {
            return Navigation::Redirect(Decision::RedirectToLogin {
                from: None,
            });
        }

        let required = match route.required_role() {
            Some(role) => role,
            None => {
                return Navigation::Render {
                    route,
                    chrome: None,
                }
            },
        };

        match self.check(path, required) {
            // authorized means the stored role is the required one
            Decision::Allow => Navigation::Render {
                route,
                chrome: Some(Chrome::for_role(required)),
            },
            redirect => Navigation::Redirect(redirect),
        }
    }

    /// Follow a menu entry. Logging out clears the session and lands on the
    /// login page.
    pub fn perform(&self, action: MenuAction) -> Navigation {
        match action {
            MenuAction::Navigate(route) => self.navigate(route.path()),
            MenuAction::Logout => {
                match self.store.clear() {
                    Ok(()) => log::info!("Logged out"),
                    Err(e) => log::warn!("Unable to clear the session: {}", e),
                }

                Navigation::Render {
                    route: Route::Login,
                    chrome: None,
                }
            },
        }
    }
}

/// Where to go after logging in, given where the user was originally
/// headed.
///
/// Only pages the new role may see are honoured, anything else goes to the
/// role's dashboard.
pub fn return_path(from: Option<&str>, role: Role) -> &'static str {
    from.and_then(Route::parse)
        .filter(|route| route.required_role() == Some(role))
        .map(Route::path)
        .unwrap_or_else(|| role.dashboard_path())
}
