use std::env;
use std::sync::RwLock;

/// Supplies the access credential for each remote attempt.
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

/// Session credential store: an explicitly synced key takes precedence over
/// the environment-provided one.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    session: RwLock<Option<String>>,
    environment: Option<String>,
}

impl SessionCredentials {
    pub fn new(environment: Option<String>) -> Self {
        Self {
            session: RwLock::new(None),
            environment: environment.and_then(normalize),
        }
    }

    pub fn from_env() -> Self {
        Self::new(env_api_key())
    }

    /// Store a key entered during the session.
    pub fn sync(&self, key: impl Into<String>) -> bool {
        let key = normalize(key.into());
        match self.session.write() {
            Ok(mut session) => {
                let accepted = key.is_some();
                *session = key;
                accepted
            }
            Err(_) => {
                log::error!("Credential store is poisoned, session key not stored");
                false
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut session) = self.session.write() {
            *session = None;
        }
    }

    pub fn has_session_key(&self) -> bool {
        self.session
            .read()
            .map(|session| session.is_some())
            .unwrap_or(false)
    }
}

impl CredentialProvider for SessionCredentials {
    fn api_key(&self) -> Option<String> {
        let session = self.session.read().ok().and_then(|s| s.clone());
        session.or_else(|| self.environment.clone())
    }
}

/// Reads `GEMINI_API_KEY`, then `API_KEY`.
pub fn env_api_key() -> Option<String> {
    ["GEMINI_API_KEY", "API_KEY"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find_map(normalize)
}

// Placeholder strings leak in from templated environments.
fn normalize(key: String) -> Option<String> {
    let trimmed = key.trim();
    match trimmed {
        "" | "undefined" | "null" => None,
        _ => Some(trimmed.to_string()),
    }
}
