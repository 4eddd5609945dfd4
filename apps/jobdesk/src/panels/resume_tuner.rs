//! Resume Tuner Panel — uploads the master resume with a job (saved or
//! pasted) and shows what the backend changed.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::backend_client::JobsBackend;
use crate::errors::ClientError;
use crate::models::job::{JobId, SavedJob};
use crate::models::resume::{ChangedBullet, ResumeFile, TuneRequest, TuneResponse, TuneTarget};
use crate::panels::{
    lock, PanelState, RequestSequencer, NOT_SIGNED_IN_MESSAGE, RESUME_PICKER_PAGE_SIZE,
};
use crate::session::Subscription;

pub const MISSING_RESUME_MESSAGE: &str = "Upload your master resume (.docx) first.";
pub const NOT_DOCX_MESSAGE: &str = "Please upload a .docx file";
pub const MISSING_TARGET_MESSAGE: &str = "Choose a saved job or paste a job description.";

/// A successful tune, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct TuneOutcome {
    pub download_link: String,
    pub changed: Vec<ChangedBullet>,
    pub removed_count: usize,
    pub scoring_backend: Option<String>,
}

impl TuneOutcome {
    fn from_response(base_url: &str, response: TuneResponse) -> Self {
        let download_link = if response.download_url.starts_with("http") {
            response.download_url
        } else {
            format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                response.download_url.trim_start_matches('/')
            )
        };
        Self {
            download_link,
            removed_count: response.removed_bullets.len(),
            changed: response.changed_bullets,
            scoring_backend: response.scoring_backend,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeTunerState {
    /// Saved jobs offered in the picker.
    pub jobs: Vec<SavedJob>,
    pub resume: Option<ResumeFile>,
    pub target: Option<TuneTarget>,
    pub use_llm: bool,
    pub result: Option<TuneOutcome>,
    pub status: PanelState,
}

pub struct ResumeTuner {
    backend: Arc<dyn JobsBackend>,
    session: Subscription,
    base_url: String,
    sequencer: RequestSequencer,
    /// The picker loads independently of tune submissions.
    picker_sequencer: RequestSequencer,
    state: Mutex<ResumeTunerState>,
}

impl ResumeTuner {
    pub fn new(
        backend: Arc<dyn JobsBackend>,
        session: Subscription,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            session,
            base_url: base_url.into(),
            sequencer: RequestSequencer::default(),
            picker_sequencer: RequestSequencer::default(),
            state: Mutex::new(ResumeTunerState::default()),
        }
    }

    pub fn snapshot(&self) -> ResumeTunerState {
        lock(&self.state).clone()
    }

    /// Fills the job picker with one wide page of saved jobs. A failure
    /// leaves the picker as it was.
    pub async fn load_jobs(&self) -> Result<usize, ClientError> {
        let user_id = self
            .session
            .user_id()
            .ok_or_else(|| ClientError::validation(NOT_SIGNED_IN_MESSAGE))?;
        let token = self.picker_sequencer.issue();
        let page = self
            .backend
            .fetch_user_jobs(&user_id, 1, RESUME_PICKER_PAGE_SIZE)
            .await?;
        let count = page.jobs.len();
        if self.picker_sequencer.is_current(token) {
            lock(&self.state).jobs = page.jobs;
            debug!("Resume picker loaded {count} jobs");
        } else {
            debug!("Dropping stale resume picker response");
        }
        Ok(count)
    }

    pub fn select_file(&self, resume: ResumeFile) -> Result<(), ClientError> {
        if !resume.is_docx() {
            return Err(ClientError::validation(NOT_DOCX_MESSAGE));
        }
        lock(&self.state).resume = Some(resume);
        Ok(())
    }

    /// Targets a saved job. The apply link comes from the picker when the
    /// job is listed there.
    pub fn select_job(&self, id: JobId) {
        let mut state = lock(&self.state);
        let application_link = state
            .jobs
            .iter()
            .find(|job| job.id == id)
            .and_then(|job| job.application_link.clone());
        state.target = Some(TuneTarget::SavedJob {
            id,
            application_link,
        });
    }

    /// Targets a pasted description. Blank text clears the target.
    pub fn enter_description(&self, text: &str, job_url: Option<String>) {
        let text = text.trim();
        lock(&self.state).target = (!text.is_empty()).then(|| TuneTarget::Description {
            text: text.to_string(),
            job_url: job_url.filter(|url| !url.trim().is_empty()),
        });
    }

    pub fn set_use_llm(&self, use_llm: bool) {
        lock(&self.state).use_llm = use_llm;
    }

    /// Sends the tune request. On failure the previous result stays visible.
    pub async fn submit(&self) -> Result<TuneOutcome, ClientError> {
        let user_id = self
            .session
            .user_id()
            .ok_or_else(|| ClientError::validation(NOT_SIGNED_IN_MESSAGE))?;

        let request = {
            let state = lock(&self.state);
            let resume = state
                .resume
                .clone()
                .ok_or_else(|| ClientError::validation(MISSING_RESUME_MESSAGE))?;
            let target = state
                .target
                .clone()
                .ok_or_else(|| ClientError::validation(MISSING_TARGET_MESSAGE))?;
            TuneRequest {
                resume,
                user_id,
                target,
                use_llm: state.use_llm,
            }
        };

        let token = self.sequencer.issue();
        lock(&self.state).status = PanelState::Loading;
        info!("Tuning {} (llm: {})", request.resume.file_name, request.use_llm);

        let result = self.backend.tune_resume(&request).await;

        let mut state = lock(&self.state);
        let current = self.sequencer.is_current(token);
        match result {
            Ok(response) => {
                let outcome = TuneOutcome::from_response(&self.base_url, response);
                if current {
                    state.result = Some(outcome.clone());
                    state.status = PanelState::Success;
                } else {
                    debug!("Dropping stale tune response");
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("Resume tuning failed: {e}");
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
