use crate::{
    endpoints::{self, EndpointError},
    storage::StorageError,
    Appointment, AppointmentStatus, NewAppointment, NewPatient, PatientRecord,
    SessionStore, ValidationError,
};
use reqwest::{Client, StatusCode};
use url::Url;

/// Authenticated access to appointments and patient records, using whatever
/// token is in the [`SessionStore`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    store: SessionStore,
}

impl ApiClient {
    pub fn new(http: Client, base_url: Url, store: SessionStore) -> Self {
        ApiClient {
            http,
            base_url,
            store,
        }
    }

    pub async fn doctor_appointments(
        &self,
    ) -> Result<Vec<Appointment>, ApiError> {
        let token = self.token()?;

        endpoints::doctor_appointments(&self.http, &self.base_url, &token)
            .await
            .map_err(|e| {
                ApiError::from_endpoint(e, "Failed to load appointments")
            })
    }

    pub async fn patient_appointments(
        &self,
    ) -> Result<Vec<Appointment>, ApiError> {
        let token = self.token()?;

        endpoints::patient_appointments(&self.http, &self.base_url, &token)
            .await
            .map_err(|e| {
                ApiError::from_endpoint(e, "Failed to load appointments")
            })
    }

    /// Book an appointment, defaulting to the patient's assigned doctor.
    pub async fn book_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Option<String>, ApiError> {
        let token = self.token()?;
        let mut appointment = appointment.clone();

        if appointment.doctor_id.is_none() {
            let session = self.store.read()?;
            let doctor = session
                .user
                .as_ref()
                .and_then(|user| user.assigned_doctor())
                .ok_or(ApiError::MissingDoctor)?;
            appointment.doctor_id = Some(doctor.to_string());
        }
        if appointment.treatment.trim().is_empty() {
            let missing = ValidationError::MissingField { name: "treatment" };
            return Err(missing.into());
        }

        endpoints::book_appointment(
            &self.http,
            &self.base_url,
            &token,
            &appointment,
        )
        .await
        .map_err(|e| ApiError::from_endpoint(e, "Failed to book appointment"))
    }

    /// Accept or reject a pending appointment.
    pub async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Option<String>, ApiError> {
        if status == AppointmentStatus::Pending {
            return Err(ApiError::InvalidStatus(status));
        }
        let token = self.token()?;

        endpoints::update_appointment_status(
            &self.http,
            &self.base_url,
            &token,
            id,
            status,
        )
        .await
        .map_err(|e| {
            ApiError::from_endpoint(e, "Failed to update appointment status")
        })
    }

    pub async fn patients(&self) -> Result<Vec<PatientRecord>, ApiError> {
        let token = self.token()?;

        endpoints::patients(&self.http, &self.base_url, &token)
            .await
            .map_err(|e| ApiError::from_endpoint(e, "Failed to load patients"))
    }

    /// Register a patient, assigning them to the logged-in doctor unless
    /// told otherwise.
    pub async fn create_patient(
        &self,
        patient: &NewPatient,
    ) -> Result<Option<String>, ApiError> {
        patient.validate()?;
        let token = self.token()?;
        let mut patient = patient.clone();

        if patient.assigned_doctor.is_none() {
            let session = self.store.read()?;
            patient.assigned_doctor = session
                .user
                .as_ref()
                .and_then(|user| user.record_id())
                .map(String::from);
        }

        endpoints::create_patient(&self.http, &self.base_url, &token, &patient)
            .await
            .map_err(|e| ApiError::from_endpoint(e, "Failed to create patient"))
    }

    pub async fn patient_profile(&self) -> Result<PatientRecord, ApiError> {
        let token = self.token()?;

        endpoints::patient_profile(&self.http, &self.base_url, &token)
            .await
            .map_err(|e| ApiError::from_endpoint(e, "Failed to load profile"))
    }

    pub async fn update_patient(
        &self,
        id: &str,
        record: &PatientRecord,
    ) -> Result<Option<String>, ApiError> {
        let token = self.token()?;

        endpoints::update_patient(
            &self.http,
            &self.base_url,
            &token,
            id,
            record,
        )
        .await
        .map_err(|e| ApiError::from_endpoint(e, "Failed to update profile"))
    }

    pub async fn update_patient_notes(
        &self,
        id: &str,
        notes: &str,
    ) -> Result<Option<String>, ApiError> {
        let token = self.token()?;

        endpoints::update_patient_notes(
            &self.http,
            &self.base_url,
            &token,
            id,
            notes,
        )
        .await
        .map_err(|e| {
            ApiError::from_endpoint(e, "Failed to update patient notes")
        })
    }

    fn token(&self) -> Result<String, ApiError> {
        self.store.token()?.ok_or(ApiError::NotAuthenticated)
    }
}

/// Possible errors that may be returned by an [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unable to reach the server")]
    Network(#[source] reqwest::Error),
    #[error("{}", message)]
    Rejected { status: StatusCode, message: String },
    #[error("Unexpected response from the server")]
    MalformedResponse(#[source] EndpointError),
    #[error("You need to log in first")]
    NotAuthenticated,
    #[error("No doctor was given and none is assigned to this patient")]
    MissingDoctor,
    #[error("An appointment can't be set back to {0}")]
    InvalidStatus(AppointmentStatus),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unable to read the session")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Rejections without a server message get `fallback` instead.
    fn from_endpoint(e: EndpointError, fallback: &str) -> ApiError {
        match e {
            EndpointError::HttpClient(inner) => ApiError::Network(inner),
            EndpointError::Rejected { status, message } => ApiError::Rejected {
                status,
                message: message.unwrap_or_else(|| fallback.to_string()),
            },
            other => ApiError::MalformedResponse(other),
        }
    }
}
