//! Picking the navigation shell that wraps a protected page.

use crate::{guard::Route, Role};

/// The chrome (side menu and friends) around an authenticated page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Chrome {
    Doctor,
    Patient,
}

impl Chrome {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Doctor => Chrome::Doctor,
            Role::Patient => Chrome::Patient,
        }
    }

    /// The entries in this chrome's side menu, top to bottom. Every menu
    /// ends with a logout button.
    pub fn menu(self) -> &'static [MenuEntry] {
        match self {
            Chrome::Doctor => DOCTOR_MENU,
            Chrome::Patient => PATIENT_MENU,
        }
    }
}

/// Choose the chrome for whoever is logged in.
///
/// A session without a role is an error rather than quietly getting the
/// patient chrome.
pub fn select(role: Option<Role>) -> Result<Chrome, LayoutError> {
    role.map(Chrome::for_role).ok_or(LayoutError::NoRole)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub action: MenuAction,
}

impl MenuEntry {
    const fn navigate(label: &'static str, route: Route) -> Self {
        MenuEntry {
            label,
            action: MenuAction::Navigate(route),
        }
    }

    const LOGOUT: MenuEntry = MenuEntry {
        label: "Logout",
        action: MenuAction::Logout,
    };
}

/// What clicking something in the menu does.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Navigate(Route),
    /// Clear the session and go back to [`Route::Login`].
    Logout,
}

const DOCTOR_MENU: &[MenuEntry] = &[
    MenuEntry::navigate("Dashboard", Route::DoctorDashboard),
    MenuEntry::navigate("Appointments", Route::DoctorAppointments),
    MenuEntry::navigate("Patients", Route::DoctorPatients),
    MenuEntry::LOGOUT,
];

const PATIENT_MENU: &[MenuEntry] = &[
    MenuEntry::navigate("Dashboard", Route::PatientDashboard),
    MenuEntry::navigate("Appointments", Route::PatientAppointments),
    MenuEntry::navigate("Profile", Route::PatientProfile),
    MenuEntry::LOGOUT,
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("The session doesn't say whether this is a doctor or a patient")]
    NoRole,
}
