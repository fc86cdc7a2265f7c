use super::{appointments::confirmation, EndpointError};
use crate::{NewPatient, PatientRecord};
use reqwest::{Client, Method};
use serde_derive::Serialize;
use url::Url;

/// All the patients a doctor can see.
pub async fn patients(
    client: &Client,
    base_url: &Url,
    token: &str,
) -> Result<Vec<PatientRecord>, EndpointError> {
    let response = super::send::<()>(
        client,
        base_url,
        Method::GET,
        "patient",
        Some(token),
        None,
    )
    .await?;

    super::read_json(response).await
}

/// Register a patient on a doctor's behalf.
pub async fn create_patient(
    client: &Client,
    base_url: &Url,
    token: &str,
    patient: &NewPatient,
) -> Result<Option<String>, EndpointError> {
    let response = super::send(
        client,
        base_url,
        Method::POST,
        "patient",
        Some(token),
        Some(patient),
    )
    .await?;

    confirmation(response).await
}

/// The logged-in patient's own record.
pub async fn patient_profile(
    client: &Client,
    base_url: &Url,
    token: &str,
) -> Result<PatientRecord, EndpointError> {
    let response = super::send::<()>(
        client,
        base_url,
        Method::GET,
        "patient/profile",
        Some(token),
        None,
    )
    .await?;

    super::read_json(response).await
}

/// Replace a patient's record.
pub async fn update_patient(
    client: &Client,
    base_url: &Url,
    token: &str,
    id: &str,
    record: &PatientRecord,
) -> Result<Option<String>, EndpointError> {
    let path = format!("patient/{}", id);
    let response = super::send(
        client,
        base_url,
        Method::PUT,
        &path,
        Some(token),
        Some(record),
    )
    .await?;

    confirmation(response).await
}

/// Overwrite the doctor's notes about a patient.
pub async fn update_patient_notes(
    client: &Client,
    base_url: &Url,
    token: &str,
    id: &str,
    notes: &str,
) -> Result<Option<String>, EndpointError> {
    // note the plural, this one lives under a different prefix
    let path = format!("patients/{}/notes", id);
    let data = Notes { notes };

    let response = super::send(
        client,
        base_url,
        Method::PATCH,
        &path,
        Some(token),
        Some(&data),
    )
    .await?;

    confirmation(response).await
}

#[derive(Debug, Copy, Clone, Serialize)]
struct Notes<'a> {
    notes: &'a str,
}
