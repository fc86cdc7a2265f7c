use crate::{
    storage::{FileStorage, MemoryStorage},
    SessionStore, DEFAULT_USER_AGENT,
};
use reqwest::Client;
use std::{env, path::PathBuf, time::Duration};
use url::Url;

/// Where the backend lives when nobody says otherwise.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/";

const SESSION_DIR: &str = ".medibook";
const SESSION_FILE: &str = "session.json";

/// Everything needed to wire up the clients.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: Url,
    /// Keep the session on disk so it outlives the process, otherwise it is
    /// only held in memory.
    pub persist_across_restarts: bool,
    pub session_file: PathBuf,
    /// Give up on requests which take longer than this. By default a request
    /// may hang forever.
    pub timeout: Option<Duration>,
}

impl Config {
    /// The defaults, overridden by any `MEDIBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_vars(|name| env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = var("MEDIBOOK_API_URL") {
            config = config.with_api_url(&url)?;
        }
        if let Some(persist) = var("MEDIBOOK_PERSIST") {
            config.persist_across_restarts = parse_bool(&persist).ok_or(
                ConfigError::BadValue {
                    name: "MEDIBOOK_PERSIST",
                    value: persist,
                },
            )?;
        }
        if let Some(path) = var("MEDIBOOK_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(secs) = var("MEDIBOOK_TIMEOUT_SECS") {
            let parsed = secs.trim().parse::<u64>().map_err(|_| {
                ConfigError::BadValue {
                    name: "MEDIBOOK_TIMEOUT_SECS",
                    value: secs.clone(),
                }
            })?;
            config.timeout = Some(Duration::from_secs(parsed));
        }

        Ok(config)
    }

    /// Point at a different backend.
    ///
    /// A trailing slash is added if missing so endpoint paths are appended
    /// rather than replacing the last segment.
    pub fn with_api_url(self, url: &str) -> Result<Self, ConfigError> {
        let mut url = url.trim().to_string();
        if !url.ends_with('/') {
            url.push('/');
        }

        let api_url = Url::parse(&url).map_err(|inner| ConfigError::BadUrl {
            url: url.clone(),
            inner,
        })?;

        Ok(Config { api_url, ..self })
    }

    pub fn session_store(&self) -> SessionStore {
        if self.persist_across_restarts {
            log::debug!(
                "Keeping the session in {}",
                self.session_file.display()
            );
            SessionStore::new(FileStorage::new(&self.session_file))
        } else {
            SessionStore::new(MemoryStorage::new())
        }
    }

    pub fn http_client(&self) -> Result<Client, reqwest::Error> {
        let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build()
    }
}

impl Default for Config {
    fn default() -> Self {
        let session_file = match home::home_dir() {
            Some(home) => home.join(SESSION_DIR).join(SESSION_FILE),
            None => PathBuf::from("medibook-session.json"),
        };

        Config {
            api_url: Url::parse(DEFAULT_API_URL)
                .expect("The default URL is always valid"),
            persist_across_restarts: true,
            session_file,
            timeout: None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Errors that may occur while putting together a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("\"{}\" is not a valid URL", url)]
    BadUrl {
        url: String,
        #[source]
        inner: url::ParseError,
    },
    #[error("\"{}\" is not a valid value for {}", value, name)]
    BadValue { name: &'static str, value: String },
}
