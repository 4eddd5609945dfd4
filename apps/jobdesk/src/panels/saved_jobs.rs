//! Saved Jobs List — paginated cache of the user's persisted jobs.
//!
//! The server is the source of truth. The cache is replaced wholesale by a
//! page fetch and patched in place by a successful status change; failures
//! never touch it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend_client::JobsBackend;
use crate::errors::ClientError;
use crate::models::job::{ApplicationStatus, JobId, Pagination, SavedJob};
use crate::panels::{
    lock, PanelState, RequestSequencer, NOT_SIGNED_IN_MESSAGE, SAVED_JOBS_PAGE_SIZE,
};
use crate::session::Subscription;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedJobsState {
    pub jobs: Vec<SavedJob>,
    pub pagination: Pagination,
    pub status: PanelState,
    /// Ids whose descriptions are shown in full.
    pub expanded: HashSet<JobId>,
}

pub struct SavedJobsList {
    backend: Arc<dyn JobsBackend>,
    session: Subscription,
    sequencer: RequestSequencer,
    state: Mutex<SavedJobsState>,
}

impl SavedJobsList {
    pub fn new(backend: Arc<dyn JobsBackend>, session: Subscription) -> Self {
        Self {
            backend,
            session,
            sequencer: RequestSequencer::default(),
            state: Mutex::new(SavedJobsState::default()),
        }
    }

    pub fn snapshot(&self) -> SavedJobsState {
        lock(&self.state).clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.current().is_some()
    }

    /// Loads one page and replaces the cache with it. On any failure the
    /// previous jobs and pagination stay as they were.
    pub async fn fetch_page(&self, user_id: &str, page: u32, limit: u32) -> Result<(), ClientError> {
        let token = self.sequencer.issue();
        lock(&self.state).status = PanelState::Loading;

        let result = self.backend.fetch_user_jobs(user_id, page, limit).await;

        let mut state = lock(&self.state);
        if !self.sequencer.is_current(token) {
            debug!("Dropping stale saved-jobs response for page {page}");
            return Ok(());
        }

        match result {
            Ok(response) => {
                state.pagination = response
                    .pagination
                    .unwrap_or_else(|| Pagination::empty_at(page))
                    .clamped();
                state.jobs = response.jobs;
                state.expanded.clear();
                state.status = PanelState::Success;
                info!(
                    "Loaded {} saved jobs (page {}/{})",
                    state.jobs.len(),
                    state.pagination.page,
                    state.pagination.last_page()
                );
                Ok(())
            }
            Err(e) => {
                warn!("Failed to fetch saved jobs: {e}");
                state.status = PanelState::Error(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetches `page` for the signed-in user at the fixed page size.
    pub async fn refresh(&self, page: u32) -> Result<(), ClientError> {
        let user_id = self
            .session
            .user_id()
            .ok_or_else(|| ClientError::validation(NOT_SIGNED_IN_MESSAGE))?;
        self.fetch_page(&user_id, page, SAVED_JOBS_PAGE_SIZE).await
    }

    /// Navigates to page `n`. Out-of-range pages are ignored without a
    /// request; returns whether a fetch happened.
    pub async fn go_to_page(&self, n: u32) -> Result<bool, ClientError> {
        let pagination = lock(&self.state).pagination;
        if !pagination.contains(n) {
            debug!("Ignoring navigation to page {n} (last page {})", pagination.last_page());
            return Ok(false);
        }
        self.refresh(n).await?;
        Ok(true)
    }

    pub async fn next_page(&self) -> Result<bool, ClientError> {
        let current = lock(&self.state).pagination.page;
        self.go_to_page(current.saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> Result<bool, ClientError> {
        let current = lock(&self.state).pagination.page;
        self.go_to_page(current.saturating_sub(1)).await
    }

    /// Sends a status change. On success only the matching cached record's
    /// `application_status` changes; nothing is refetched.
    pub async fn change_status(
        &self,
        job_id: &JobId,
        new_status: ApplicationStatus,
    ) -> Result<(), ClientError> {
        let user_id = self
            .session
            .user_id()
            .ok_or_else(|| ClientError::validation(NOT_SIGNED_IN_MESSAGE))?;

        match self
            .backend
            .update_job_status(&user_id, job_id, new_status)
            .await
        {
            Ok(()) => {
                let mut state = lock(&self.state);
                if let Some(job) = state.jobs.iter_mut().find(|job| &job.id == job_id) {
                    job.application_status = new_status;
                }
                Ok(())
            }
            Err(e) => {
                warn!("Failed to update job {job_id} status: {e}");
                let mut state = lock(&self.state);
                if !state.status.is_loading() {
                    state.status = PanelState::Error(format!(
                        "Failed to update status: {}",
                        e.user_message()
                    ));
                }
                Err(e)
            }
        }
    }

    /// Flips the full-description toggle for one record; returns the new value.
    pub fn toggle_expanded(&self, job_id: &JobId) -> bool {
        let mut state = lock(&self.state);
        if state.expanded.remove(job_id) {
            false
        } else {
            state.expanded.insert(job_id.clone());
            true
        }
    }

    pub fn expand_all(&self) {
        let mut state = lock(&self.state);
        let ids: Vec<JobId> = state.jobs.iter().map(|job| job.id.clone()).collect();
        state.expanded.extend(ids);
    }

    pub fn acknowledge(&self) {
        lock(&self.state).status.acknowledge();
    }

    /// Drops the cache when the user signs out; loads page 1 when someone
    /// signs in. Ends when the session manager goes away.
    pub fn watch_session(self: &Arc<Self>, mut changes: Subscription) -> JoinHandle<()> {
        let list = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(session) = changes.changed().await {
                match session {
                    Some(session) => {
                        if let Err(e) = list.fetch_page(&session.user_id, 1, SAVED_JOBS_PAGE_SIZE).await {
                            warn!("Could not load saved jobs after sign-in: {e}");
                        }
                    }
                    None => {
                        // Invalidate anything still in flight for the old user.
                        list.sequencer.issue();
                        *lock(&list.state) = SavedJobsState::default();
                    }
                }
            }
        })
    }
}
