use std::collections::HashMap;

use crate::dto::auth::UserInfo;

const TOKEN_KEY: &str = "session.token";
const USER_KEY: &str = "session.user";

/// Durable key-value storage the session is persisted through.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Signed-in state of the client: bearer token plus the user it belongs to.
#[derive(Debug)]
pub struct Session<S: KeyValueStore> {
    store: S,
    token: Option<String>,
    user: Option<UserInfo>,
}

impl<S: KeyValueStore> Session<S> {
    /// Load whatever the store holds. A token without a readable user is
    /// treated as signed out.
    pub fn restore(mut store: S) -> Self {
        let token = store.get(TOKEN_KEY);
        let user = store
            .get(USER_KEY)
            .and_then(|raw| match serde_json::from_str::<UserInfo>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!(error = %err, "discarding unreadable stored user");
                    None
                }
            });

        match (token, user) {
            (Some(token), Some(user)) => Self {
                store,
                token: Some(token),
                user: Some(user),
            },
            _ => {
                store.remove(TOKEN_KEY);
                store.remove(USER_KEY);
                Self {
                    store,
                    token: None,
                    user: None,
                }
            }
        }
    }

    pub fn sign_in(&mut self, token: String, user: UserInfo) -> Result<(), serde_json::Error> {
        let encoded = serde_json::to_string(&user)?;
        self.store.set(TOKEN_KEY, token.clone());
        self.store.set(USER_KEY, encoded);
        self.token = Some(token);
        self.user = Some(user);
        Ok(())
    }

    pub fn sign_out(&mut self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
        self.token = None;
        self.user = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// Value for the `Authorization` header of protected calls.
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
