use super::EndpointError;
use crate::{Identity, Profile, Role};
use reqwest::{Client, Method, Response};
use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use url::Url;

/// Authenticate with the backend as either a doctor or a patient.
pub async fn login(
    client: &Client,
    base_url: &Url,
    credentials: &Credentials,
    role: Role,
) -> Result<Authenticated, EndpointError> {
    let response = super::send(
        client,
        base_url,
        Method::POST,
        role.login_path(),
        None,
        Some(credentials),
    )
    .await?;

    authenticated(role, response).await
}

/// Turn a 2xx login/signup response into an [`Authenticated`] session.
pub(super) async fn authenticated(
    role: Role,
    response: Response,
) -> Result<Authenticated, EndpointError> {
    let status = response.status();

    let body: LoginResponse = super::read_json(response).await?;
    log::trace!("Parsed response: {:#?}", body);

    interpret_response(role, body)
        .map_err(|message| EndpointError::Rejected { status, message })
}

/// A successful login.
///
/// The backend occasionally hands out a token without the profile that
/// should come with it, so `user` may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    pub token: String,
    pub role: Role,
    pub user: Option<Profile>,
}

impl Authenticated {
    /// The [`Identity`] behind this login, if the profile came back.
    pub fn identity(&self) -> Option<Identity> {
        self.user
            .clone()
            .map(|profile| Identity::new(self.role, profile))
    }
}

/// What somebody types into the login form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: Password,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
}

impl Credentials {
    pub fn new<E, P>(email: E, password: P) -> Self
    where
        E: Into<String>,
        P: Into<Password>,
    {
        Credentials {
            email: email.into(),
            password: password.into(),
            remember_me: None,
        }
    }

    pub fn remember_me(self, remember_me: bool) -> Self {
        Credentials {
            remember_me: Some(remember_me),
            ..self
        }
    }
}

/// A password which won't show up in logs.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn expose(&self) -> &str { &self.0 }
}

impl<S: Into<String>> From<S> for Password {
    fn from(other: S) -> Password { Password(other.into()) }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Password").field(&"********").finish()
    }
}

/// Doctors get back `{token, user}` while patients get `{token, patient}`.
/// Signing up returns the same shape as a doctor login.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct LoginResponse {
    token: Option<String>,
    user: Option<Profile>,
    patient: Option<Profile>,
    message: Option<String>,
}

/// A 2xx response without a token, carrying the server's message if it
/// sent one.
type NoToken = Option<String>;

fn interpret_response(
    role: Role,
    response: LoginResponse,
) -> Result<Authenticated, NoToken> {
    let LoginResponse {
        token,
        user,
        patient,
        message,
    } = response;

    let token = match token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            log::warn!("Login as a {} didn't return a token", role);
            return Err(message);
        },
    };

    let user = match role {
        Role::Doctor => user,
        Role::Patient => patient,
    };

    match user {
        Some(ref profile) => {
            log::info!("Logged in as {} ({})", profile.email, role)
        },
        None => log::warn!("Logged in as a {}, but no profile came back", role),
    }

    Ok(Authenticated { token, role, user })
}
