use std::sync::Arc;

use anyhow::Result;

use crate::backend_client::{BackendClient, JobsBackend};
use crate::config::Config;
use crate::panels::job_search::JobSearchPanel;
use crate::panels::profile::ProfilePanel;
use crate::panels::resume_tuner::ResumeTuner;
use crate::panels::saved_jobs::SavedJobsList;
use crate::session::{SessionManager, StaticAuthProvider};

/// Shared application state, built once at startup and handed to every
/// command. Panels are constructed from it with their own session
/// subscription.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn JobsBackend>,
    pub session: SessionManager,
}

impl AppState {
    pub async fn init(config: Config) -> Result<Self> {
        let backend = BackendClient::new(config.api_url.clone(), config.request_timeout)?;
        let provider = StaticAuthProvider::new(config.user_id.clone(), config.user_email.clone());
        let session = SessionManager::init(Arc::new(provider)).await?;
        Ok(Self {
            config,
            backend: Arc::new(backend),
            session,
        })
    }

    pub fn saved_jobs(&self) -> Arc<SavedJobsList> {
        Arc::new(SavedJobsList::new(
            self.backend.clone(),
            self.session.subscribe(),
        ))
    }

    /// The search panel refreshes `saved_jobs` after every successful scrape.
    pub fn job_search(&self, saved_jobs: Arc<SavedJobsList>) -> JobSearchPanel {
        JobSearchPanel::new(self.backend.clone(), self.session.subscribe(), saved_jobs)
    }

    pub fn resume_tuner(&self) -> ResumeTuner {
        ResumeTuner::new(
            self.backend.clone(),
            self.session.subscribe(),
            self.config.api_url.clone(),
        )
    }

    pub fn profile(&self) -> ProfilePanel {
        ProfilePanel::new(self.backend.clone(), self.session.subscribe())
    }
}
