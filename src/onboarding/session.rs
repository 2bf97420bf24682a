//! Per-user conversation sessions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::onboarding::state::Stage;

/// Collected lead details. Fields fill in as the conversation advances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadFields {
    pub platform: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub region: Option<String>,
}

impl LeadFields {
    /// All required details collected, ready to persist. Platform is
    /// optional; the step is skipped when no platform set is configured.
    pub fn is_complete(&self) -> bool {
        self.email.is_some() && self.phone.is_some() && self.region.is_some()
    }
}

/// One user's conversation state. Cleared entirely once the lead is
/// written, so a replayed confirm after completion finds no session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub stage: Stage,
    pub fields: LeadFields,
}

impl Session {
    /// Move to `target` if the stage machine allows it. An illegal target
    /// leaves the session unchanged and returns false.
    pub fn advance(&mut self, target: Stage) -> bool {
        if self.stage.can_transition_to(target) {
            self.stage = target;
            true
        } else {
            false
        }
    }
}

/// Session persistence, keyed by Telegram user id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: i64) -> Option<Session>;
    async fn put(&self, user_id: i64, session: Session);
    async fn remove(&self, user_id: i64);
}

/// Process-local session store. Sessions do not survive a restart; a user
/// mid-conversation starts over with /start.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: i64) -> Option<Session> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    async fn put(&self, user_id: i64, session: Session) {
        self.sessions.write().await.insert(user_id, session);
    }

    async fn remove(&self, user_id: i64) {
        self.sessions.write().await.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let store = InMemorySessionStore::new();
        let mut a = Session::default();
        a.stage = Stage::AwaitEmail;
        store.put(1, a).await;
        store.put(2, Session::default()).await;

        assert_eq!(store.get(1).await.unwrap().stage, Stage::AwaitEmail);
        assert_eq!(store.get(2).await.unwrap().stage, Stage::StartDecision);
        assert!(store.get(3).await.is_none());
    }

    #[tokio::test]
    async fn remove_clears_the_session() {
        let store = InMemorySessionStore::new();
        store.put(7, Session::default()).await;
        store.remove(7).await;
        assert!(store.get(7).await.is_none());
    }

    #[test]
    fn fields_complete_without_optional_platform() {
        let mut fields = LeadFields::default();
        assert!(!fields.is_complete());
        fields.email = Some("a@b.co".into());
        fields.phone = Some("+447700900000".into());
        assert!(!fields.is_complete());
        fields.region = Some("UK/EU".into());
        assert!(fields.is_complete(), "platform must not be required");
    }

    #[test]
    fn advance_rejects_illegal_transitions() {
        let mut session = Session::default();
        assert!(!session.advance(Stage::AwaitPhone));
        assert_eq!(session.stage, Stage::StartDecision);
        assert!(session.advance(Stage::AwaitPlatform));
        assert_eq!(session.stage, Stage::AwaitPlatform);
    }
}
