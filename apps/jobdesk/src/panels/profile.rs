//! Profile Panel — the user's projects, experiences and skills.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::backend_client::JobsBackend;
use crate::errors::ClientError;
use crate::models::profile::UserProfile;
use crate::panels::{lock, PanelState, RequestSequencer, NOT_SIGNED_IN_MESSAGE};
use crate::session::Subscription;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub profile: UserProfile,
    pub status: PanelState,
    /// Message from the last successful save.
    pub notice: Option<String>,
}

pub struct ProfilePanel {
    backend: Arc<dyn JobsBackend>,
    session: Subscription,
    sequencer: RequestSequencer,
    state: Mutex<ProfileState>,
}

impl ProfilePanel {
    pub fn new(backend: Arc<dyn JobsBackend>, session: Subscription) -> Self {
        Self {
            backend,
            session,
            sequencer: RequestSequencer::default(),
            state: Mutex::new(ProfileState::default()),
        }
    }

    pub fn snapshot(&self) -> ProfileState {
        lock(&self.state).clone()
    }

    fn user_id(&self) -> Result<String, ClientError> {
        self.session
            .user_id()
            .ok_or_else(|| ClientError::validation(NOT_SIGNED_IN_MESSAGE))
    }

    pub async fn load(&self) -> Result<UserProfile, ClientError> {
        let user_id = self.user_id()?;
        let token = self.sequencer.issue();
        lock(&self.state).status = PanelState::Loading;

        let result = self.backend.user_info(&user_id).await;

        let mut state = lock(&self.state);
        let current = self.sequencer.is_current(token);
        match result {
            Ok(profile) => {
                if current {
                    state.profile = profile.clone();
                    state.status = PanelState::Success;
                } else {
                    debug!("Dropping stale profile response");
                }
                Ok(profile)
            }
            Err(e) => {
                warn!("Failed to load profile: {e}");
                if current {
                    state.status = PanelState::Error(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// Replaces the local profile; nothing is sent until `save`.
    pub fn edit(&self, profile: UserProfile) {
        let mut state = lock(&self.state);
        state.profile = profile;
        state.notice = None;
    }

    /// Sends the local profile and returns the server's message.
    pub async fn save(&self) -> Result<String, ClientError> {
        let user_id = self.user_id()?;
        let token = self.sequencer.issue();
        let profile = {
            let mut state = lock(&self.state);
            state.status = PanelState::Loading;
            state.profile.clone()
        };

        let result = self.backend.update_user_info(&user_id, &profile).await;

        let mut state = lock(&self.state);
        let current = self.sequencer.is_current(token);
        match result {
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Profile updated".to_string());
                info!(
                    "Saved profile ({} projects, {} experiences, {} skills)",
                    profile.projects.len(),
                    profile.experiences.len(),
                    profile.skills.len()
                );
                if current {
                    state.notice = Some(message.clone());
                    state.status = PanelState::Success;
                } else {
                    debug!("Dropping stale profile save response");
                }
                Ok(message)
            }
            Err(e) => {
                warn!("Failed to save profile: {e}");
                if current {
                    state.status = PanelState::Error(e.user_message());
                }
                Err(e)
            }
        }
    }

    pub fn acknowledge(&self) {
        lock(&self.state).status.acknowledge();
    }
}
