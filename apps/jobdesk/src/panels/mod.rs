//! Panels: the stateful views of the dashboard.
//!
//! Every panel runs the same cycle, `Idle → Loading → {Success, Error}`, and
//! returns to `Idle` once its result has been shown (`acknowledge`). A panel
//! may have several requests in flight; each takes a token from the panel's
//! `RequestSequencer` and only the newest one is allowed to write state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod job_search;
pub mod profile;
pub mod resume_tuner;
pub mod saved_jobs;

/// Saved-jobs page size. Fixed; users cannot change it.
pub const SAVED_JOBS_PAGE_SIZE: u32 = 50;
/// The resume tuner's job picker loads one wider page.
pub const RESUME_PICKER_PAGE_SIZE: u32 = 100;

pub const NOT_SIGNED_IN_MESSAGE: &str = "User session not found. Please log out and in again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PanelState {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl PanelState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    /// Back to `Idle` after a result has been rendered. Leaves `Loading` alone.
    pub fn acknowledge(&mut self) {
        if !self.is_loading() {
            *self = PanelState::Idle;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Hands out monotonically increasing tokens; the last one issued wins.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// Locks panel state. A poisoned lock still holds consistent data because
/// state is only ever replaced wholesale under it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::json;

    use crate::models::job::{Pagination, SavedJob, UserJobsPage};
    use crate::session::{Session, SessionManager, StaticAuthProvider};

    pub async fn signed_in(user_id: &str) -> SessionManager {
        SessionManager::init(Arc::new(StaticAuthProvider::new(
            Some(user_id.to_string()),
            format!("{user_id}@example.com"),
        )))
        .await
        .unwrap()
    }

    pub async fn signed_out() -> SessionManager {
        SessionManager::init(Arc::new(StaticAuthProvider::new(None, String::new())))
            .await
            .unwrap()
    }

    pub fn saved_job(id: i64) -> SavedJob {
        serde_json::from_value(json!({
            "id": id,
            "job_name": format!("Job {id}"),
            "company": "Acme",
            "location": "Toronto, ON",
            "description": "Build things.",
            "application_status": "not_applied",
            "created_at": "2024-05-01T12:00:00+00:00",
            "user_id": "u1"
        }))
        .unwrap()
    }

    pub fn page_of(ids: std::ops::Range<i64>, page: u32, total: u32, total_pages: u32) -> UserJobsPage {
        UserJobsPage {
            jobs: ids.map(saved_job).collect(),
            pagination: Some(Pagination {
                page,
                total,
                total_pages,
            }),
        }
    }

    pub fn session(user_id: &str) -> Session {
        Session {
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
        }
    }
}
