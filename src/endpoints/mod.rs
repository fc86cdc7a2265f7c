//! The booking backend's REST endpoints.

mod appointments;
mod login;
mod patients;
mod reset_password;
mod signup;

pub use appointments::{
    book_appointment, doctor_appointments, patient_appointments,
    update_appointment_status,
};
pub use login::{login, Authenticated, Credentials, Password};
pub use patients::{
    create_patient, patient_profile, patients, update_patient,
    update_patient_notes,
};
pub use reset_password::reset_password;
pub use signup::{signup, SignupData};

use reqwest::{Client, Error as ReqwestError, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_derive::Deserialize;
use std::fmt::Debug;
use url::Url;

/// Typical endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The HTTP client encountered an error.
    #[error("Unable to send the request")]
    HttpClient(#[from] ReqwestError),
    #[error("Unable to build the URL for \"{}\"", path)]
    BadUrl {
        path: String,
        #[source]
        inner: url::ParseError,
    },
    /// The server answered with a non-2xx status code.
    #[error("The server rejected the request with {}", status)]
    Rejected {
        status: StatusCode,
        /// The `message` field from the response body, if there was one.
        message: Option<String>,
    },
    /// Unable to parse the JSON in the response.
    #[error("Unable to parse the response")]
    BadBody(#[from] serde_json::Error),
    #[error("The response didn't contain a \"{}\" field", name)]
    MissingField { name: &'static str },
}

impl EndpointError {
    /// The server-supplied reason for rejecting a request, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            EndpointError::Rejected {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

/// The `{"message": "..."}` body most responses carry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

async fn send<D>(
    client: &Client,
    base_url: &Url,
    method: Method,
    path: &str,
    token: Option<&str>,
    data: Option<&D>,
) -> Result<Response, EndpointError>
where
    D: Debug + Serialize + ?Sized,
{
    let url = base_url.join(path).map_err(|inner| EndpointError::BadUrl {
        path: path.to_string(),
        inner,
    })?;

    log::debug!("Sending a {} request to {}", method, url);

    let mut request = client.request(method, url);

    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    if let Some(data) = data {
        log::trace!("Payload: {:#?}", data);
        request = request.json(data);
    }

    let response = request.send().await?;
    log::trace!("Headers: {:#?}", response.headers());

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await?;
    log::trace!("Response: {}", String::from_utf8_lossy(&body));

    let message = serde_json::from_slice::<MessageResponse>(&body)
        .ok()
        .and_then(|msg| msg.message)
        .filter(|msg| !msg.is_empty());

    log::warn!(
        "The server rejected the request with {} ({})",
        status,
        message.as_deref().unwrap_or("no message"),
    );

    Err(EndpointError::Rejected { status, message })
}

async fn read_json<T>(response: Response) -> Result<T, EndpointError>
where
    T: DeserializeOwned,
{
    let body = response.bytes().await?;
    log::trace!("Response: {}", String::from_utf8_lossy(&body));

    serde_json::from_slice(&body).map_err(EndpointError::from)
}
