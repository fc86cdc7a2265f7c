use crate::{
    endpoints::{self, Authenticated, Credentials, EndpointError, SignupData},
    storage::StorageError,
    Role, Session, SessionStore,
};
use reqwest::{Client, StatusCode};
use url::Url;

/// What gets shown when the server rejects a request without saying why.
pub const FALLBACK_MESSAGE: &str = "An error occurred";

/// Logs people in and out, keeping a [`SessionStore`] up to date.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    base_url: Url,
    store: SessionStore,
}

impl AuthClient {
    pub fn new(http: Client, base_url: Url, store: SessionStore) -> Self {
        AuthClient {
            http,
            base_url,
            store,
        }
    }

    pub fn store(&self) -> &SessionStore { &self.store }

    /// Log in as a doctor or a patient, replacing any existing session.
    pub async fn login(
        &self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<Session, AuthError> {
        log::debug!("Logging in {} as a {}", credentials.email, role);

        let authenticated =
            endpoints::login(&self.http, &self.base_url, credentials, role)
                .await?;

        self.save(&authenticated)
    }

    /// Register a new account and log straight into it.
    ///
    /// The form is validated before anything is sent.
    pub async fn signup(
        &self,
        data: &SignupData,
        role: Role,
    ) -> Result<Session, AuthError> {
        if role != Role::Doctor {
            return Err(ValidationError::UnsupportedRole(role).into());
        }
        data.validate()?;

        log::debug!("Signing up {}", data.email);

        let authenticated =
            endpoints::signup(&self.http, &self.base_url, data).await?;

        self.save(&authenticated)
    }

    /// Ask for password reset instructions. The current session, if any, is
    /// left alone.
    pub async fn reset_password(
        &self,
        email: &str,
    ) -> Result<String, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingEmail.into());
        }

        let message =
            endpoints::reset_password(&self.http, &self.base_url, email)
                .await?;

        Ok(message)
    }

    /// Forget the current session. This never touches the network.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()?;
        log::info!("Logged out");

        Ok(())
    }

    pub fn is_authenticated(&self) -> bool { self.store.is_authenticated() }

    /// Any 2xx response with a token becomes the new session, even when the
    /// profile is missing. The route guard logs such a session back out.
    fn save(
        &self,
        authenticated: &Authenticated,
    ) -> Result<Session, AuthError> {
        let Authenticated { token, role, .. } = authenticated;

        match authenticated.identity() {
            Some(identity) => self.store.write(token, &identity)?,
            None => self.store.write_without_profile(token, *role)?,
        }

        Ok(self.store.read()?)
    }

    pub fn session(&self) -> Result<Session, AuthError> {
        self.store.read().map_err(AuthError::from)
    }
}

/// Possible errors that may be returned by an [`AuthClient`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request never got a response.
    #[error("Unable to reach the server")]
    Network(#[source] reqwest::Error),
    /// The server turned the request down.
    #[error("{}", message)]
    Rejected {
        status: Option<StatusCode>,
        message: String,
    },
    /// The request was never sent because it would have been rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The server answered, but not in a way we understand.
    #[error("Unexpected response from the server")]
    MalformedResponse(#[source] EndpointError),
    #[error("Unable to save the session")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Something suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<EndpointError> for AuthError {
    fn from(e: EndpointError) -> AuthError {
        match e {
            EndpointError::HttpClient(inner) => AuthError::Network(inner),
            EndpointError::Rejected { status, message } => {
                AuthError::Rejected {
                    status: Some(status),
                    message: message
                        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
                }
            },
            other => AuthError::MalformedResponse(other),
        }
    }
}

/// A precondition which was checked locally, before talking to the server.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Passwords do not match!")]
    PasswordMismatch,
    #[error("Please enter your email address.")]
    MissingEmail,
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),
    #[error("The \"{}\" field is required", name)]
    MissingField { name: &'static str },
    #[error("A {0} can't sign up on their own")]
    UnsupportedRole(Role),
}
