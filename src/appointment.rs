//! Appointments and the bits of bookkeeping the dashboards do with them.

use chrono::{DateTime, NaiveDate, Utc};
use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A booked (or requested) appointment.
///
/// Doctors see who the patient is, patients see who the doctor is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<Participant>,
    pub time: DateTime<Utc>,
    pub treatment: String,
    pub duration: String,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Appointment {
    /// The person on the other side of the appointment.
    pub fn counterpart(&self) -> Option<&Participant> {
        self.patient.as_ref().or_else(|| self.doctor.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_specialty: Option<String>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    Rejected,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Accepted => "Accepted",
            AppointmentStatus::Rejected => "Rejected",
        }
    }
}

impl Display for AppointmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "accepted" => Ok(AppointmentStatus::Accepted),
            "rejected" => Ok(AppointmentStatus::Rejected),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not an appointment status")]
pub struct UnknownStatus(pub String);

/// A patient asking for an appointment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub time: DateTime<Utc>,
    pub treatment: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Defaults to the patient's assigned doctor when left empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
}

/// Which appointments a doctor wants to see.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(AppointmentStatus),
}

impl StatusFilter {
    fn matches(self, status: AppointmentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl Default for StatusFilter {
    fn default() -> Self { StatusFilter::All }
}

/// Narrow a list of appointments down by status and by the name of whoever
/// is on the other side, earliest first.
pub fn filter_appointments<'a>(
    appointments: &'a [Appointment],
    filter: StatusFilter,
    search: &str,
) -> Vec<&'a Appointment> {
    let search = search.trim().to_lowercase();

    let mut matches: Vec<&Appointment> = appointments
        .iter()
        .filter(|apt| filter.matches(apt.status))
        .filter(|apt| {
            search.is_empty()
                || apt
                    .counterpart()
                    .map(|who| who.full_name().to_lowercase().contains(&search))
                    .unwrap_or(false)
        })
        .collect();

    matches.sort_by_key(|apt| apt.time);
    matches
}

/// Which appointments a patient wants to see.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeFilter {
    All,
    Upcoming,
    Past,
}

impl TimeFilter {
    pub fn matches(self, time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            TimeFilter::All => true,
            TimeFilter::Upcoming => time >= now,
            TimeFilter::Past => time < now,
        }
    }
}

impl Default for TimeFilter {
    fn default() -> Self { TimeFilter::All }
}

/// Split appointments around `now`, earliest first.
pub fn filter_by_time(
    appointments: &[Appointment],
    filter: TimeFilter,
    now: DateTime<Utc>,
) -> Vec<&Appointment> {
    let mut matches: Vec<&Appointment> = appointments
        .iter()
        .filter(|apt| filter.matches(apt.time, now))
        .collect();

    matches.sort_by_key(|apt| apt.time);
    matches
}

/// How many appointments the dashboard previews.
pub const RECENT_APPOINTMENTS: usize = 5;

/// The first few appointments, in the order the server sent them.
pub fn recent(appointments: &[Appointment]) -> &[Appointment] {
    &appointments[..appointments.len().min(RECENT_APPOINTMENTS)]
}

/// The headline numbers on a doctor's dashboard.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_patients: usize,
    pub today_appointments: usize,
    pub pending_appointments: usize,
}

impl DashboardStats {
    /// `today` is compared against each appointment's UTC date.
    pub fn compute(
        appointments: &[Appointment],
        patient_count: usize,
        today: NaiveDate,
    ) -> Self {
        DashboardStats {
            total_patients: patient_count,
            today_appointments: appointments
                .iter()
                .filter(|apt| apt.time.date_naive() == today)
                .count(),
            pending_appointments: appointments
                .iter()
                .filter(|apt| apt.status == AppointmentStatus::Pending)
                .count(),
        }
    }
}
