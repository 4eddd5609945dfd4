//! Job Search Panel — runs a LinkedIn scrape and holds its results for the
//! rest of the session only. A successful scrape refreshes page 1 of the
//! saved jobs list, since the backend persists new postings as a side effect.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::backend_client::JobsBackend;
use crate::errors::ClientError;
use crate::models::job::{ScrapeRequest, ScrapedJob};
use crate::panels::saved_jobs::SavedJobsList;
use crate::panels::{lock, PanelState, RequestSequencer, NOT_SIGNED_IN_MESSAGE};
use crate::session::Subscription;

pub const DEFAULT_NUM_JOBS: u32 = 56;
pub const DEFAULT_SEARCH_TITLE: &str = "intern";
/// Scrape sizes offered by the dashboard: 2, 4, 8, 12 and 20 result pages.
pub const NUM_JOBS_PRESETS: [u32; 5] = [14, 28, 56, 84, 140];

#[derive(Clone)]
pub struct SearchConfig {
    pub username: String,
    pub password: String,
    pub num_jobs: u32,
    pub search_title: String,
    pub location: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            num_jobs: DEFAULT_NUM_JOBS,
            search_title: DEFAULT_SEARCH_TITLE.to_string(),
            location: String::new(),
        }
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("num_jobs", &self.num_jobs)
            .field("search_title", &self.search_title)
            .field("location", &self.location)
            .finish()
    }
}

/// What the last scrape reported about persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub total_jobs: u32,
    pub saved: Option<u32>,
    pub duplicates: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSearchState {
    pub jobs: Vec<ScrapedJob>,
    pub summary: Option<ScrapeSummary>,
    pub status: PanelState,
    /// List indices whose descriptions are shown in full.
    pub expanded: HashSet<usize>,
}

pub struct JobSearchPanel {
    backend: Arc<dyn JobsBackend>,
    session: Subscription,
    saved_jobs: Arc<SavedJobsList>,
    sequencer: RequestSequencer,
    state: Mutex<JobSearchState>,
}

impl JobSearchPanel {
    pub fn new(
        backend: Arc<dyn JobsBackend>,
        session: Subscription,
        saved_jobs: Arc<SavedJobsList>,
    ) -> Self {
        Self {
            backend,
            session,
            saved_jobs,
            sequencer: RequestSequencer::default(),
            state: Mutex::new(JobSearchState::default()),
        }
    }

    pub fn snapshot(&self) -> JobSearchState {
        lock(&self.state).clone()
    }

    /// Runs a scrape. Missing session or credentials fail before any request.
    pub async fn search(&self, config: &SearchConfig) -> Result<ScrapeSummary, ClientError> {
        let user_id = self
            .session
            .user_id()
            .ok_or_else(|| ClientError::validation(NOT_SIGNED_IN_MESSAGE))?;
        if config.username.trim().is_empty() || config.password.is_empty() {
            return Err(ClientError::validation(
                "Please enter your LinkedIn credentials",
            ));
        }

        let request = ScrapeRequest {
            linkedin_username: config.username.trim().to_string(),
            linkedin_password: config.password.clone(),
            num_jobs: config.num_jobs,
            search_title: Some(config.search_title.trim().to_string()),
            location: Some(config.location.trim().to_string()),
            user_id: Some(user_id.clone()),
        };

        let token = self.sequencer.issue();
        lock(&self.state).status = PanelState::Loading;
        info!(
            "Searching LinkedIn for '{}' in '{}'",
            request.search_title.as_deref().unwrap_or_default(),
            if config.location.trim().is_empty() {
                "any location"
            } else {
                config.location.trim()
            }
        );

        let result = self.backend.scrape_jobs(&request).await;

        let summary = {
            let mut state = lock(&self.state);
            let current = self.sequencer.is_current(token);
            match result {
                Ok(response) => {
                    let summary = ScrapeSummary {
                        total_jobs: response.total(),
                        saved: response.database.as_ref().map(|db| db.saved),
                        duplicates: response.database.as_ref().map(|db| db.duplicates),
                    };
                    if !current {
                        debug!("Dropping stale scrape response");
                        return Ok(summary);
                    }
                    state.jobs = response.jobs;
                    state.expanded.clear();
                    state.summary = Some(summary.clone());
                    state.status = PanelState::Success;
                    summary
                }
                Err(e) => {
                    warn!("Scrape failed: {e}");
                    if current {
                        state.status = PanelState::Error(e.user_message());
                    }
                    return Err(e);
                }
            }
        };

        if let Err(e) = self.saved_jobs.refresh(1).await {
            warn!("Scrape finished but saved jobs could not be refreshed: {e}");
        }
        Ok(summary)
    }

    pub fn toggle_expanded(&self, index: usize) -> bool {
        let mut state = lock(&self.state);
        if state.expanded.remove(&index) {
            false
        } else {
            state.expanded.insert(index);
            true
        }
    }

    pub fn expand_all(&self) {
        let mut state = lock(&self.state);
        let count = state.jobs.len();
        state.expanded.extend(0..count);
    }

    pub fn acknowledge(&self) {
        lock(&self.state).status.acknowledge();
    }
}
