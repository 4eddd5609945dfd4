//! Backend client — the single point of entry for every call to the job
//! backend (scraping, saved jobs, resume tuning, profile, chat).
//!
//! No other module builds URLs or talks HTTP. Panels and bot commands depend
//! on the `JobsBackend` trait; `BackendClient` is the HTTP implementation.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::models::chat::{EchoResponse, HealthStatus, MessageRequest, RagResponse};
use crate::models::job::{
    ApplicationStatus, JobId, ScrapeRequest, ScrapeResponse, StatusUpdateRequest, UserJobsPage,
};
use crate::models::profile::{ProfileUpdateRequest, ProfileUpdateResponse, UserProfile};
use crate::models::resume::{TuneRequest, TuneResponse, TuneTarget, DOCX_MIME};

#[cfg(test)]
pub mod fake;

const JOBS_ENDPOINT: &str = "/api/jobs";
const USER_JOBS_ENDPOINT: &str = "/api/user-jobs";
const RESUME_TUNE_ENDPOINT: &str = "/api/resume/tune";
const USER_INFO_ENDPOINT: &str = "/api/user/info";
const USER_UPDATE_ENDPOINT: &str = "/api/user/update";
const ECHO_ENDPOINT: &str = "/api/echo";
const RAG_ENDPOINT: &str = "/api/rag";
const HEALTH_ENDPOINT: &str = "/healthz";

/// Everything the client needs from the backend.
///
/// Carried as `Arc<dyn JobsBackend>` so panels and command handlers can be
/// exercised against an in-memory backend.
#[async_trait]
pub trait JobsBackend: Send + Sync {
    async fn scrape_jobs(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, ClientError>;

    async fn fetch_user_jobs(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<UserJobsPage, ClientError>;

    async fn update_job_status(
        &self,
        user_id: &str,
        job_id: &JobId,
        status: ApplicationStatus,
    ) -> Result<(), ClientError>;

    async fn tune_resume(&self, request: &TuneRequest) -> Result<TuneResponse, ClientError>;

    async fn user_info(&self, user_id: &str) -> Result<UserProfile, ClientError>;

    async fn update_user_info(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<ProfileUpdateResponse, ClientError>;

    async fn echo(&self, message: &str) -> Result<EchoResponse, ClientError>;

    async fn rag(&self, question: &str) -> Result<RagResponse, ClientError>;

    async fn health(&self) -> Result<HealthStatus, ClientError>;
}

/// HTTP implementation of `JobsBackend`. One base URL, resolved at startup.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `endpoint/<user_id>/<tail…>` with the id percent-encoded as a single
    /// path segment.
    fn user_url(&self, endpoint: &str, user_id: &str, tail: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.url(endpoint)).map_err(|e| {
            ClientError::validation(format!("Invalid backend URL {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::validation(format!("Invalid backend URL {}", self.base_url))
            })?
            .push(user_id)
            .extend(tail);
        Ok(url)
    }
}

#[async_trait]
impl JobsBackend for BackendClient {
    async fn scrape_jobs(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, ClientError> {
        let url = self.url(JOBS_ENDPOINT);
        info!(
            "Requesting scrape of {} jobs for '{}'",
            request.num_jobs,
            request.search_title.as_deref().unwrap_or("")
        );
        let response = self.client.post(&url).json(request).send().await?;
        read_envelope(response).await
    }

    async fn fetch_user_jobs(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<UserJobsPage, ClientError> {
        let url = self.user_url(USER_JOBS_ENDPOINT, user_id, &[])?;
        debug!("Fetching saved jobs page {page} (limit {limit})");
        let response = self
            .client
            .get(url)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn update_job_status(
        &self,
        user_id: &str,
        job_id: &JobId,
        status: ApplicationStatus,
    ) -> Result<(), ClientError> {
        let url = self.user_url(USER_JOBS_ENDPOINT, user_id, &["status"])?;
        info!("Updating job {job_id} status to {status}");
        let response = self
            .client
            .put(url)
            .json(&StatusUpdateRequest { job_id, status })
            .send()
            .await?;
        read_envelope::<Value>(response).await.map(|_| ())
    }

    async fn tune_resume(&self, request: &TuneRequest) -> Result<TuneResponse, ClientError> {
        let url = self.url(RESUME_TUNE_ENDPOINT);
        let file = Part::bytes(request.resume.bytes.clone())
            .file_name(request.resume.file_name.clone())
            .mime_str(DOCX_MIME)?;

        let mut form = Form::new()
            .part("file", file)
            .text("user_id", request.user_id.clone())
            .text("use_llm", if request.use_llm { "true" } else { "false" });

        form = match &request.target {
            TuneTarget::SavedJob {
                id,
                application_link,
            } => {
                let form = form.text("job_id", id.to_string());
                match application_link {
                    Some(link) => form.text("job_url", link.clone()),
                    None => form,
                }
            }
            TuneTarget::Description { text, job_url } => {
                let form = form.text("jd_text", text.clone());
                match job_url {
                    Some(link) => form.text("job_url", link.clone()),
                    None => form,
                }
            }
        };

        info!(
            "Submitting {} for tuning (llm: {})",
            request.resume.file_name, request.use_llm
        );
        let response = self.client.post(&url).multipart(form).send().await?;
        read_envelope(response).await
    }

    async fn user_info(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        let url = self.user_url(USER_INFO_ENDPOINT, user_id, &[])?;
        let response = self.client.get(url).send().await?;
        read_envelope(response).await
    }

    async fn update_user_info(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<ProfileUpdateResponse, ClientError> {
        let url = self.url(USER_UPDATE_ENDPOINT);
        let body = ProfileUpdateRequest {
            user_uuid: user_id,
            projects: &profile.projects,
            experiences: &profile.experiences,
            skills: &profile.skills,
        };
        let response = self.client.post(&url).json(&body).send().await?;
        read_envelope(response).await
    }

    async fn echo(&self, message: &str) -> Result<EchoResponse, ClientError> {
        let url = self.url(ECHO_ENDPOINT);
        let response = self
            .client
            .post(&url)
            .json(&MessageRequest { message })
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn rag(&self, question: &str) -> Result<RagResponse, ClientError> {
        let url = self.url(RAG_ENDPOINT);
        let response = self
            .client
            .post(&url)
            .json(&MessageRequest { message: question })
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(self.url(HEALTH_ENDPOINT)).send().await?;
        read_envelope(response).await
    }
}

/// Reads a backend reply and sorts it into the error taxonomy:
/// unparseable body → `InvalidJson`; non-2xx or `success: false` →
/// `Backend`; anything else is decoded into `T`.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    decode_envelope(status.as_u16(), &body)
}

fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        debug!("Backend returned non-JSON body (status {status}): {body}");
        ClientError::InvalidJson {
            status,
            reason: e.to_string(),
        }
    })?;

    let success_flag = value.get("success").and_then(Value::as_bool);
    let is_success_status = (200..300).contains(&status);

    if !is_success_status || success_flag == Some(false) {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Backend request failed with status {status}"));
        warn!("Backend reported failure (status {status}): {message}");
        return Err(ClientError::Backend { status, message });
    }

    serde_json::from_value(value).map_err(|e| {
        debug!("Backend body did not match the expected shape: {body}");
        ClientError::InvalidJson {
            status,
            reason: e.to_string(),
        }
    })
}
