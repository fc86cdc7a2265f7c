use super::{login::Authenticated, EndpointError, Password};
use crate::{Role, ValidationError};
use reqwest::{Client, Method};
use serde_derive::Serialize;
use url::Url;

/// Register a new doctor account.
///
/// The backend replies like a doctor login, so a successful signup is
/// already logged in. Call [`SignupData::validate()`] first, this function
/// sends whatever it is given.
pub async fn signup(
    client: &Client,
    base_url: &Url,
    data: &SignupData,
) -> Result<Authenticated, EndpointError> {
    let response = super::send(
        client,
        base_url,
        Method::POST,
        "auth/signup",
        None,
        Some(data),
    )
    .await?;

    super::login::authenticated(Role::Doctor, response).await
}

/// The registration form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Password,
    /// Only checked locally, never sent to the server.
    #[serde(skip)]
    pub confirm_password: Password,
    pub phone_number: String,
    pub state: String,
    pub medical_specialty: String,
}

impl SignupData {
    /// Check everything that can be checked without asking the server.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(())
    }
}
