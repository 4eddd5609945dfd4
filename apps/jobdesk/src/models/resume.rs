use std::path::Path;

use serde::Deserialize;

use crate::errors::ClientError;
use crate::models::job::JobId;

/// A resume picked for tuning. Held in memory so a failed submit can be
/// retried without re-reading the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

impl ResumeFile {
    pub async fn load(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.docx".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn is_docx(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".docx")
    }
}

/// What the tailored resume should be aimed at.
#[derive(Debug, Clone, PartialEq)]
pub enum TuneTarget {
    SavedJob {
        id: JobId,
        application_link: Option<String>,
    },
    Description {
        text: String,
        job_url: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuneRequest {
    pub resume: ResumeFile,
    pub user_id: String,
    pub target: TuneTarget,
    pub use_llm: bool,
}

/// One rewritten bullet. `relevance` is 0..=100.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangedBullet {
    pub index: Option<u32>,
    #[serde(default)]
    pub before: String,
    #[serde(default)]
    pub after: String,
    pub relevance: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TuneResponse {
    pub download_url: String,
    #[serde(default, alias = "change_summary")]
    pub changed_bullets: Vec<ChangedBullet>,
    #[serde(default)]
    pub removed_bullets: Vec<u32>,
    pub scoring_backend: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Master Resume.DOCX");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let file = ResumeFile::load(&path).await.unwrap();
        assert_eq!(file.file_name, "Master Resume.DOCX");
        assert_eq!(file.bytes, b"PK\x03\x04");
        assert!(file.is_docx());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResumeFile::load(&dir.path().join("nope.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }
}
