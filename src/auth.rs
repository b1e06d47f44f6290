use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use rand::RngCore;
use serde::Serialize;

/// Tokens are valid for 24 hours from issue.
const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
}

/// Authenticated caller, as attached to a request after token validation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

/// Bearer-token issuance and validation. Handlers receive an
/// implementation by reference; nothing in the crate holds token state as
/// a process-wide global.
pub trait TokenStore: Send + Sync {
    fn issue(&self, identity: Identity) -> String;
    fn validate(&self, token: &str) -> Option<Identity>;
    fn revoke(&self, token: &str);
}

struct TokenEntry {
    identity: Identity,
    issued_at: Instant,
}

/// In-process token store. Expired entries are dropped when they are next
/// presented rather than by a background sweeper.
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<String, TokenEntry>>,
    ttl: Duration,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::with_ttl(TOKEN_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn new_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryTokenStore {
    fn issue(&self, identity: Identity) -> String {
        let token = Self::new_token();
        self.tokens.write().unwrap().insert(
            token.clone(),
            TokenEntry {
                identity,
                issued_at: Instant::now(),
            },
        );
        token
    }

    fn validate(&self, token: &str) -> Option<Identity> {
        let mut tokens = self.tokens.write().unwrap();
        match tokens.get(token) {
            Some(entry) if entry.issued_at.elapsed() < self.ttl => Some(entry.identity.clone()),
            Some(_) => {
                tokens.remove(token);
                None
            }
            None => None,
        }
    }

    fn revoke(&self, token: &str) {
        self.tokens.write().unwrap().remove(token);
    }
}

/// The single admin account, read from configuration at startup.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn verify(&self, username: &str, password: &str) -> Option<Identity> {
        if username == self.username && password == self.password {
            Some(Identity {
                username: username.to_string(),
                role: Role::Admin,
            })
        } else {
            None
        }
    }
}
