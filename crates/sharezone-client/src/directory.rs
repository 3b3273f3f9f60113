use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use sharezone_types::models::Profile;

use crate::error::ClientError;
use crate::http::HttpClient;

/// Synchronous id -> profile lookup owned outside the messaging core.
pub trait ConnectionsDirectory: Send + Sync {
    fn profile(&self, id: Uuid) -> Option<Profile>;
}

/// In-memory directory, refreshed wholesale from the connections endpoint.
#[derive(Debug, Default)]
pub struct Connections {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&self, profiles: Vec<Profile>) {
        let map = profiles.into_iter().map(|p| (p.id, p)).collect();
        if let Ok(mut guard) = self.profiles.write() {
            *guard = map;
        }
    }

    /// Reload from the server. Returns the number of profiles now known.
    pub async fn refresh(&self, client: &HttpClient, token: &str) -> Result<usize, ClientError> {
        let profiles = client.connections(token).await?;
        self.replace_all(profiles);
        Ok(self.len())
    }

    pub fn len(&self) -> usize {
        self.profiles.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConnectionsDirectory for Connections {
    fn profile(&self, id: Uuid) -> Option<Profile> {
        self.profiles.read().ok()?.get(&id).cloned()
    }
}
