use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// Who a session belongs to.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Doctor, Role::Patient];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    /// The page this role lands on after logging in.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Doctor => "/doctor/dashboard",
            Role::Patient => "/patient/dashboard",
        }
    }

    /// The REST endpoint used to log in with this role.
    ///
    /// The backend doesn't offer a unified login, so doctors and patients
    /// each get their own endpoint (and their own response shape).
    pub fn login_path(self) -> &'static str {
        match self {
            Role::Doctor => "auth/login",
            Role::Patient => "patient/login",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Role, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A string which doesn't name a known [`Role`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a known role")]
pub struct UnknownRole(pub String);
