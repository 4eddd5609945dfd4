//! Session Manager — owns the signed-in identity.
//!
//! The identity provider is external; it reaches us through `AuthProvider`
//! (initial lookup, sign-out) and through `AuthEvent`s it reports. Panels
//! never write the session. They hold a `Subscription` handed to their
//! constructor and drop or `unsubscribe` it on teardown.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::errors::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

impl Session {
    /// First eight characters of the id, for display.
    pub fn short_id(&self) -> &str {
        match self.user_id.char_indices().nth(8) {
            Some((idx, _)) => &self.user_id[..idx],
            None => &self.user_id,
        }
    }
}

/// Notifications pushed by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
    Expired,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session the provider already holds, if any.
    async fn current_session(&self) -> Result<Option<Session>, ClientError>;

    async fn sign_out(&self) -> Result<(), ClientError>;
}

/// Provider backed by configured credentials: the user id and email come
/// from the environment or the command line.
pub struct StaticAuthProvider {
    session: Option<Session>,
}

impl StaticAuthProvider {
    pub fn new(user_id: Option<String>, email: String) -> Self {
        Self {
            session: user_id.map(|user_id| Session { user_id, email }),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_session(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.session.clone())
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionManager {
    provider: Arc<dyn AuthProvider>,
    sender: Arc<watch::Sender<Option<Session>>>,
}

impl SessionManager {
    /// Asks the provider for an existing session and starts tracking it.
    pub async fn init(provider: Arc<dyn AuthProvider>) -> Result<Self, ClientError> {
        let initial = provider.current_session().await?;
        if let Some(session) = &initial {
            info!("Restored session for user {}", session.short_id());
        }
        let (sender, _) = watch::channel(initial);
        Ok(Self {
            provider,
            sender: Arc::new(sender),
        })
    }

    pub fn current(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    /// Applies a provider notification and wakes every subscriber.
    pub fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                info!("User {} signed in", session.short_id());
                self.sender.send_replace(Some(session));
            }
            AuthEvent::SignedOut => {
                info!("User signed out");
                self.sender.send_replace(None);
            }
            AuthEvent::Expired => {
                info!("Session expired");
                self.sender.send_replace(None);
            }
        }
    }

    /// Signs out through the provider, then clears the session locally.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.provider.sign_out().await?;
        self.handle_event(AuthEvent::SignedOut);
        Ok(())
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Read-only view of the session held by a panel.
pub struct Subscription {
    receiver: watch::Receiver<Option<Session>>,
}

impl Subscription {
    pub fn current(&self) -> Option<Session> {
        self.receiver.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.receiver.borrow().as_ref().map(|s| s.user_id.clone())
    }

    /// Waits for the next sign-in/sign-out. `None` once the manager is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> Session {
        Session {
            user_id: id.to_string(),
            email: format!("{id}@example.com"),
        }
    }

    #[tokio::test]
    async fn test_init_restores_provider_session() {
        let provider = Arc::new(StaticAuthProvider::new(
            Some("8c2d5e1f-aaaa-bbbb".to_string()),
            "me@example.com".to_string(),
        ));
        let manager = SessionManager::init(provider).await.unwrap();
        let current = manager.current().unwrap();
        assert_eq!(current.email, "me@example.com");
        assert_eq!(current.short_id(), "8c2d5e1f");
    }

    #[tokio::test]
    async fn test_subscribers_see_sign_in_and_sign_out() {
        let manager = SessionManager::init(Arc::new(StaticAuthProvider::new(None, String::new())))
            .await
            .unwrap();
        let mut sub = manager.subscribe();
        assert_eq!(sub.current(), None);

        manager.handle_event(AuthEvent::SignedIn(session("u1")));
        assert_eq!(sub.changed().await, Some(Some(session("u1"))));
        assert_eq!(sub.user_id().as_deref(), Some("u1"));

        manager.handle_event(AuthEvent::Expired);
        assert_eq!(sub.changed().await, Some(None));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let manager = SessionManager::init(Arc::new(StaticAuthProvider::new(
            Some("u1".to_string()),
            String::new(),
        )))
        .await
        .unwrap();
        manager.sign_out().await.unwrap();
        assert_eq!(manager.current(), None);
    }

    #[tokio::test]
    async fn test_unsubscribe_detaches_receiver() {
        let manager = SessionManager::init(Arc::new(StaticAuthProvider::new(None, String::new())))
            .await
            .unwrap();
        let first = manager.subscribe();
        let _second = manager.subscribe();
        assert_eq!(manager.subscriber_count(), 2);
        first.unsubscribe();
        assert_eq!(manager.subscriber_count(), 1);
    }

    #[test]
    fn test_short_id_on_short_ids() {
        assert_eq!(session("u1").short_id(), "u1");
    }
}
