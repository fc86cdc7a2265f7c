use super::{EndpointError, MessageResponse};
use crate::{Appointment, AppointmentStatus, NewAppointment};
use reqwest::{Client, Method};
use serde_derive::Serialize;
use url::Url;

/// Every appointment booked with the logged-in doctor.
pub async fn doctor_appointments(
    client: &Client,
    base_url: &Url,
    token: &str,
) -> Result<Vec<Appointment>, EndpointError> {
    list(client, base_url, token, "appointments/doctor").await
}

/// Every appointment the logged-in patient has booked.
pub async fn patient_appointments(
    client: &Client,
    base_url: &Url,
    token: &str,
) -> Result<Vec<Appointment>, EndpointError> {
    list(client, base_url, token, "appointments/patient").await
}

async fn list(
    client: &Client,
    base_url: &Url,
    token: &str,
    path: &str,
) -> Result<Vec<Appointment>, EndpointError> {
    let response = super::send::<()>(
        client,
        base_url,
        Method::GET,
        path,
        Some(token),
        None,
    )
    .await?;

    super::read_json(response).await
}

/// Ask for a new appointment. The server's confirmation message is returned
/// if it sent one.
pub async fn book_appointment(
    client: &Client,
    base_url: &Url,
    token: &str,
    appointment: &NewAppointment,
) -> Result<Option<String>, EndpointError> {
    let response = super::send(
        client,
        base_url,
        Method::POST,
        "appointments/book",
        Some(token),
        Some(appointment),
    )
    .await?;

    confirmation(response).await
}

/// Accept or reject an appointment.
pub async fn update_appointment_status(
    client: &Client,
    base_url: &Url,
    token: &str,
    id: &str,
    status: AppointmentStatus,
) -> Result<Option<String>, EndpointError> {
    let path = format!("appointments/{}/status", id);
    let data = StatusUpdate { status };

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

/// Mutations reply with anything from an empty body to the updated
/// record, so only a `message` is picked out.
pub(super) async fn confirmation(
    response: reqwest::Response,
) -> Result<Option<String>, EndpointError> {
    let body = response.bytes().await?;
    log::trace!("Response: {}", String::from_utf8_lossy(&body));

    Ok(serde_json::from_slice::<MessageResponse>(&body)
        .ok()
        .and_then(|msg| msg.message))
}

#[derive(Debug, Copy, Clone, Serialize)]
struct StatusUpdate {
    status: AppointmentStatus,
}
