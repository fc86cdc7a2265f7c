//! The client-side core of a patient/doctor appointment-booking app.
//!
//! A [`SessionStore`] remembers who is logged in, the [`AuthClient`] logs
//! people in and out against the REST backend, the [`RouteGuard`] decides
//! which pages the current session may see, and [`layout`] picks the
//! navigation chrome around them. The [`ApiClient`] covers the appointment
//! and patient resources the pages work with.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod api;
pub mod appointment;
mod auth;
mod config;
pub mod endpoints;
pub mod guard;
pub mod layout;
pub mod patient;
mod role;
mod session;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use auth::{AuthClient, AuthError, ValidationError, FALLBACK_MESSAGE};
pub use config::{Config, ConfigError, DEFAULT_API_URL};
pub use endpoints::{Credentials, Password, SignupData};
pub use guard::{Decision, GuardState, Navigation, Route, RouteGuard};
pub use layout::Chrome;
pub use patient::{NewPatient, PatientRecord};
pub use role::{Role, UnknownRole};
pub use session::{Identity, Profile, Session, SessionStore};

/// The default user agent to use when communicating with the backend.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
