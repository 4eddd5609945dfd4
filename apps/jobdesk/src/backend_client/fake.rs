//! In-memory `JobsBackend` for panel and command tests.
//!
//! Each endpoint has a queue of scripted replies; a call pops the next one
//! and panics when none is left, so an unexpected request fails the test.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::JobsBackend;
use crate::errors::ClientError;
use crate::models::chat::{EchoResponse, HealthStatus, RagResponse};
use crate::models::job::{ApplicationStatus, JobId, ScrapeRequest, ScrapeResponse, UserJobsPage};
use crate::models::profile::{ProfileUpdateResponse, UserProfile};
use crate::models::resume::{TuneRequest, TuneResponse};

pub enum Scripted<T> {
    Ok(T),
    /// Replies `Ok` after the given delay.
    Slow(Duration, T),
    /// `success: false` with this error message.
    Fail(String),
    /// Body that is not JSON.
    Garbled,
}

impl<T> Scripted<T> {
    async fn resolve(self) -> Result<T, ClientError> {
        match self {
            Scripted::Ok(value) => Ok(value),
            Scripted::Slow(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            Scripted::Fail(message) => Err(ClientError::Backend {
                status: 500,
                message,
            }),
            Scripted::Garbled => Err(ClientError::InvalidJson {
                status: 200,
                reason: "expected value at line 1 column 1".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Scrape(ScrapeRequest),
    FetchPage { user_id: String, page: u32, limit: u32 },
    UpdateStatus { job_id: JobId, status: ApplicationStatus },
    Tune(TuneRequest),
    UserInfo(String),
    UpdateUserInfo(UserProfile),
    Echo(String),
    Rag(String),
    Health,
}

#[derive(Default)]
pub struct FakeBackend {
    pub scrapes: Mutex<VecDeque<Scripted<ScrapeResponse>>>,
    pub pages: Mutex<VecDeque<Scripted<UserJobsPage>>>,
    pub status_updates: Mutex<VecDeque<Scripted<()>>>,
    pub tunes: Mutex<VecDeque<Scripted<TuneResponse>>>,
    pub profiles: Mutex<VecDeque<Scripted<UserProfile>>>,
    pub profile_saves: Mutex<VecDeque<Scripted<ProfileUpdateResponse>>>,
    pub echoes: Mutex<VecDeque<Scripted<EchoResponse>>>,
    pub rags: Mutex<VecDeque<Scripted<RagResponse>>>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T>(queue: &Mutex<VecDeque<Scripted<T>>>, reply: Scripted<T>) {
        queue.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &Mutex<VecDeque<Scripted<T>>>, endpoint: &str) -> Scripted<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected call to {endpoint}"))
    }
}

#[async_trait]
impl JobsBackend for FakeBackend {
    async fn scrape_jobs(&self, request: &ScrapeRequest) -> Result<ScrapeResponse, ClientError> {
        self.record(Call::Scrape(request.clone()));
        Self::next(&self.scrapes, "scrape_jobs").resolve().await
    }

    async fn fetch_user_jobs(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<UserJobsPage, ClientError> {
        self.record(Call::FetchPage {
            user_id: user_id.to_string(),
            page,
            limit,
        });
        Self::next(&self.pages, "fetch_user_jobs").resolve().await
    }

    async fn update_job_status(
        &self,
        _user_id: &str,
        job_id: &JobId,
        status: ApplicationStatus,
    ) -> Result<(), ClientError> {
        self.record(Call::UpdateStatus {
            job_id: job_id.clone(),
            status,
        });
        Self::next(&self.status_updates, "update_job_status")
            .resolve()
            .await
    }

    async fn tune_resume(&self, request: &TuneRequest) -> Result<TuneResponse, ClientError> {
        self.record(Call::Tune(request.clone()));
        Self::next(&self.tunes, "tune_resume").resolve().await
    }

    async fn user_info(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        self.record(Call::UserInfo(user_id.to_string()));
        Self::next(&self.profiles, "user_info").resolve().await
    }

    async fn update_user_info(
        &self,
        _user_id: &str,
        profile: &UserProfile,
    ) -> Result<ProfileUpdateResponse, ClientError> {
        self.record(Call::UpdateUserInfo(profile.clone()));
        Self::next(&self.profile_saves, "update_user_info")
            .resolve()
            .await
    }

    async fn echo(&self, message: &str) -> Result<EchoResponse, ClientError> {
        self.record(Call::Echo(message.to_string()));
        Self::next(&self.echoes, "echo").resolve().await
    }

    async fn rag(&self, question: &str) -> Result<RagResponse, ClientError> {
        self.record(Call::Rag(question.to_string()));
        Self::next(&self.rags, "rag").resolve().await
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.record(Call::Health);
        Ok(HealthStatus {
            status: "ok".to_string(),
        })
    }
}
