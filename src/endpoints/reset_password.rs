use super::{EndpointError, MessageResponse};
use reqwest::{Client, Method};
use serde_derive::Serialize;
use url::Url;

/// Ask the backend to send password reset instructions to `email`.
///
/// Returns whatever message the server wants shown to the user.
pub async fn reset_password(
    client: &Client,
    base_url: &Url,
    email: &str,
) -> Result<String, EndpointError> {
    let data = Data { email };
    let response = super::send(
        client,
        base_url,
        Method::POST,
        "auth/reset-password",
        None,
        Some(&data),
    )
    .await?;

    let body: MessageResponse = super::read_json(response).await?;

    body.message
        .ok_or(EndpointError::MissingField { name: "message" })
}

#[derive(Debug, Copy, Clone, Serialize)]
struct Data<'a> {
    email: &'a str,
}
