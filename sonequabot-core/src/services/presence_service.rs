// File: src/services/presence_service.rs

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use sonequabot_common::models::{ConnectedUser, OverlayTask};

use crate::platforms::NotificationSink;

/// Who is in the channel right now, keyed by lower-case login.
///
/// Fed by JOIN/PART only. A user showing up for the first time is announced
/// on the overlay; a repeated JOIN for someone already present is not.
pub struct PresenceTracker {
    users: DashMap<String, ConnectedUser>,
    sink: Arc<dyn NotificationSink>,
}

impl PresenceTracker {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            users: DashMap::new(),
            sink,
        }
    }

    /// Returns true if the user was not already present.
    pub fn on_join(&self, user_name: &str) -> bool {
        let key = user_name.to_lowercase();
        if self.users.contains_key(&key) {
            debug!("(Presence) '{}' joined again", user_name);
            return false;
        }
        self.users.insert(key, ConnectedUser::new(user_name));
        warn!("User connected: {}, total connected: {}", user_name, self.users.len());
        self.sink.push(OverlayTask::SendUserAppear(user_name.to_string()));
        true
    }

    /// Returns true if the user was present.
    pub fn on_part(&self, user_name: &str) -> bool {
        let removed = self.users.remove(&user_name.to_lowercase()).is_some();
        if removed {
            warn!("User disconnected: {}, total connected: {}", user_name, self.users.len());
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }

    pub fn is_present(&self, user_name: &str) -> bool {
        self.users.contains_key(&user_name.to_lowercase())
    }

    pub fn get(&self, user_name: &str) -> Option<ConnectedUser> {
        self.users.get(&user_name.to_lowercase()).map(|u| u.value().clone())
    }
}
