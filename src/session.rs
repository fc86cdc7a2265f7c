use crate::{
    storage::{MemoryStorage, Storage, StorageError},
    Role,
};
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";
const ROLE_KEY: &str = "userType";

/// The profile fields the backend sends back for a logged-in user.
///
/// Doctors and patients share the first few fields, anything else (e.g. a
/// patient's `_id` or `assignedDoctor`) is kept around verbatim in
/// [`Profile::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The record's ID, falling back to the `_id` some endpoints send
    /// instead of `id`.
    pub fn record_id(&self) -> Option<&str> {
        if !self.id.is_empty() {
            return Some(&self.id);
        }

        self.extra
            .get("_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// The doctor a patient has been assigned to, if any.
    pub fn assigned_doctor(&self) -> Option<&str> {
        self.extra
            .get("assignedDoctor")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Who somebody logged in as, with the backend's doctor/patient payload
/// differences normalized away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "profile", rename_all = "lowercase")]
pub enum Identity {
    Doctor(Profile),
    Patient(Profile),
}

impl Identity {
    pub fn new(role: Role, profile: Profile) -> Self {
        match role {
            Role::Doctor => Identity::Doctor(profile),
            Role::Patient => Identity::Patient(profile),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Doctor(_) => Role::Doctor,
            Identity::Patient(_) => Role::Patient,
        }
    }

    pub fn profile(&self) -> &Profile {
        match self {
            Identity::Doctor(profile) | Identity::Patient(profile) => profile,
        }
    }

    pub fn into_profile(self) -> Profile {
        match self {
            Identity::Doctor(profile) | Identity::Patient(profile) => profile,
        }
    }
}

/// A snapshot of the client-local authentication state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<Profile>,
    pub role: Option<Role>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool { self.token.is_some() }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none() && self.role.is_none()
    }

    /// The [`Identity`] behind this session, if both halves are present.
    pub fn identity(&self) -> Option<Identity> {
        match (self.role, &self.user) {
            (Some(role), Some(user)) => Some(Identity::new(role, user.clone())),
            _ => None,
        }
    }
}

/// Where the `token`, `user`, and `userType` keys live.
///
/// Cloning a [`SessionStore`] gives you another handle to the same backing
/// [`Storage`], so it can be handed to every component that needs it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: Arc<Mutex<Box<dyn Storage>>>,
}

impl SessionStore {
    pub fn new<S>(storage: S) -> Self
    where
        S: Storage + 'static,
    {
        let storage: Box<dyn Storage> = Box::new(storage);

        SessionStore {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// A store which is forgotten when the process exits.
    pub fn in_memory() -> Self { SessionStore::new(MemoryStorage::new()) }

    /// Save a new session, replacing whatever was there before.
    pub fn write(
        &self,
        token: &str,
        identity: &Identity,
    ) -> Result<(), StorageError> {
        let user = serde_json::to_string(identity.profile())
            .expect("A map of strings and JSON values is always serializable");
        let role = identity.role();

        // all three keys go in under the one lock
        self.lock().apply(&[
            (TOKEN_KEY, Some(token)),
            (USER_KEY, Some(user.as_str())),
            (ROLE_KEY, Some(role.as_str())),
        ])?;

        log::debug!("Saved a {} session", role);

        Ok(())
    }

    /// Save a token and role whose profile never arrived.
    ///
    /// Any previous `user` is removed so it can't be mistaken for this
    /// session's profile. The route guard treats the result as inconsistent.
    pub fn write_without_profile(
        &self,
        token: &str,
        role: Role,
    ) -> Result<(), StorageError> {
        self.lock().apply(&[
            (TOKEN_KEY, Some(token)),
            (USER_KEY, None),
            (ROLE_KEY, Some(role.as_str())),
        ])?;

        log::debug!("Saved a {} session without a profile", role);

        Ok(())
    }

    /// Get a snapshot of the current session.
    ///
    /// Without a token the session is empty, regardless of any stray keys. A
    /// `user` or `userType` which can't be parsed is reported as missing.
    pub fn read(&self) -> Result<Session, StorageError> {
        let storage = self.lock();

        let token = storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let token = match token {
            Some(token) => token,
            None => return Ok(Session::default()),
        };

        let user = storage.get(USER_KEY)?.and_then(|raw| {
            serde_json::from_str::<Profile>(&raw)
                .map_err(|e| log::warn!("Ignoring a malformed user: {}", e))
                .ok()
        });

        let role = storage.get(ROLE_KEY)?.and_then(|raw| {
            raw.parse::<Role>()
                .map_err(|e| log::warn!("Ignoring the stored role: {}", e))
                .ok()
        });

        Ok(Session {
            token: Some(token),
            user,
            role,
        })
    }

    /// Forget the current session.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.lock()
            .apply(&[(TOKEN_KEY, None), (USER_KEY, None), (ROLE_KEY, None)])
    }

    pub fn is_authenticated(&self) -> bool {
        match self.token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                log::warn!("Unable to read the session token: {}", e);
                false
            },
        }
    }

    /// The current bearer token, if any. An empty token counts as none.
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Storage>> {
        // a panic while holding the lock can't leave the map half-updated
        // because every mutation is a single apply() call
        match self.storage.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[cfg(test)]
    pub(crate) fn raw_set(&self, key: &str, value: &str) {
        self.lock().set(key, value).unwrap();
    }
}
