//! Command Handlers — the `/echo`, `/jobs` and `/rag` slash commands.
//!
//! Each handler parses its options, optionally defers, makes one backend
//! call and replies within Discord's message budget. The gateway itself is
//! out of process: it hands us an interaction's name and options, and we
//! answer through `CommandContext`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::backend_client::JobsBackend;
use crate::errors::ClientError;

pub mod echo;
pub mod jobs;
pub mod rag;

/// Discord's hard cap on message content.
pub const MAX_DISCORD_LENGTH: usize = 2000;
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";
/// Over-budget replies keep this many characters before the marker.
const TRUNCATED_BODY_CHARS: usize = MAX_DISCORD_LENGTH - 20;

pub const CONTACT_FAILURE_REPLY: &str = "❌ Failed to contact backend.";
pub const INVALID_JSON_REPLY: &str = "⚠️ Backend did not return valid JSON.";

/// Where a handler's output goes. Implemented by the gateway adapter.
#[async_trait]
pub trait CommandContext: Send {
    /// Acknowledges the interaction so a slow reply is not timed out.
    async fn defer(&mut self, ephemeral: bool) -> Result<()>;

    async fn reply(&mut self, content: &str) -> Result<()>;

    /// Fills in the reply after `defer`.
    async fn edit_reply(&mut self, content: &str) -> Result<()>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '/{0}'")]
    UnknownCommand(String),

    #[error("Missing required option '{0}'")]
    MissingOption(&'static str),

    #[error("Option '{name}' must be {expected}")]
    InvalidOption {
        name: &'static str,
        expected: &'static str,
    },
}

/// A parsed slash-command invocation.
#[derive(Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Echo {
        text: String,
    },
    Jobs {
        keywords: String,
        linkedin_username: String,
        linkedin_password: String,
        num_jobs: Option<u32>,
    },
    Rag {
        question: String,
    },
}

impl std::fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlashCommand::Echo { text } => f.debug_struct("Echo").field("text", text).finish(),
            SlashCommand::Jobs {
                keywords,
                linkedin_username,
                num_jobs,
                ..
            } => f
                .debug_struct("Jobs")
                .field("keywords", keywords)
                .field("linkedin_username", linkedin_username)
                .field("linkedin_password", &"<redacted>")
                .field("num_jobs", num_jobs)
                .finish(),
            SlashCommand::Rag { question } => {
                f.debug_struct("Rag").field("question", question).finish()
            }
        }
    }
}

impl SlashCommand {
    /// Builds a command from an interaction's name and its `options` array
    /// (`[{"name": ..., "type": ..., "value": ...}]`).
    pub fn from_interaction(name: &str, options: &Value) -> Result<Self, CommandError> {
        let options = InteractionOptions(options);
        match name {
            "echo" => Ok(SlashCommand::Echo {
                text: options.required_str("text")?,
            }),
            "jobs" => Ok(SlashCommand::Jobs {
                keywords: options.required_str("keywords")?,
                linkedin_username: options.required_str("linkedin_username")?,
                linkedin_password: options.required_str("linkedin_password")?,
                num_jobs: options.optional_u32("num_jobs")?,
            }),
            "rag" => Ok(SlashCommand::Rag {
                question: options.required_str("question")?,
            }),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SlashCommand::Echo { .. } => "echo",
            SlashCommand::Jobs { .. } => "jobs",
            SlashCommand::Rag { .. } => "rag",
        }
    }
}

struct InteractionOptions<'a>(&'a Value);

impl InteractionOptions<'_> {
    fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .as_array()?
            .iter()
            .find(|option| option.get("name").and_then(Value::as_str) == Some(name))?
            .get("value")
    }

    fn required_str(&self, name: &'static str) -> Result<String, CommandError> {
        match self.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(CommandError::InvalidOption {
                name,
                expected: "a string",
            }),
            None => Err(CommandError::MissingOption(name)),
        }
    }

    fn optional_u32(&self, name: &'static str) -> Result<Option<u32>, CommandError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or(CommandError::InvalidOption {
                    name,
                    expected: "a non-negative integer",
                }),
        }
    }
}

/// Cuts a reply to Discord's limit. Counts characters, not bytes.
pub fn fit_to_budget(reply: String) -> String {
    if reply.chars().count() <= MAX_DISCORD_LENGTH {
        return reply;
    }
    let cut: String = reply.chars().take(TRUNCATED_BODY_CHARS).collect();
    format!("{cut}{TRUNCATION_MARKER}")
}

/// Reply text for a failed backend call.
pub fn error_reply(err: &ClientError) -> String {
    match err {
        ClientError::Network(_) => CONTACT_FAILURE_REPLY.to_string(),
        ClientError::InvalidJson { .. } => INVALID_JSON_REPLY.to_string(),
        other => format!("❌ {}", other.user_message()),
    }
}

/// Dispatches parsed commands to their handlers.
#[derive(Clone)]
pub struct CommandHandlers {
    backend: Arc<dyn JobsBackend>,
    /// Attached to `/jobs` scrapes so results land in this user's saved jobs.
    bot_user_id: Option<String>,
}

impl CommandHandlers {
    pub fn new(backend: Arc<dyn JobsBackend>, bot_user_id: Option<String>) -> Self {
        Self {
            backend,
            bot_user_id,
        }
    }

    pub async fn dispatch(
        &self,
        command: SlashCommand,
        ctx: &mut dyn CommandContext,
    ) -> Result<()> {
        info!("Handling /{}", command.name());
        match command {
            SlashCommand::Echo { text } => echo::handle(self.backend.as_ref(), &text, ctx).await,
            SlashCommand::Jobs {
                keywords,
                linkedin_username,
                linkedin_password,
                num_jobs,
            } => {
                let args = jobs::JobsArgs {
                    keywords,
                    linkedin_username,
                    linkedin_password,
                    num_jobs: num_jobs
                        .filter(|n| *n > 0)
                        .unwrap_or(jobs::DEFAULT_NUM_JOBS),
                };
                jobs::handle(
                    self.backend.as_ref(),
                    args,
                    self.bot_user_id.as_deref(),
                    ctx,
                )
                .await
            }
            SlashCommand::Rag { question } => {
                rag::handle(self.backend.as_ref(), &question, ctx).await
            }
        }
    }

    /// Parses and runs a raw interaction. Unparseable input gets an
    /// ephemeral-style error reply instead of a backend call.
    pub async fn handle_interaction(
        &self,
        name: &str,
        options: &Value,
        ctx: &mut dyn CommandContext,
    ) -> Result<()> {
        match SlashCommand::from_interaction(name, options) {
            Ok(command) => self.dispatch(command, ctx).await,
            Err(e) => {
                warn!("Rejected interaction /{name}: {e}");
                ctx.reply(&format!("❌ {e}")).await
            }
        }
    }
}

/// Command registration payloads, in the shape Discord's application
/// commands endpoint expects.
pub fn command_definitions() -> Value {
    const STRING: u8 = 3;
    const INTEGER: u8 = 4;

    json!([
        {
            "name": "echo",
            "description": "Ask the backend to echo your message!",
            "options": [
                {"name": "text", "description": "Text to echo", "type": STRING, "required": true}
            ]
        },
        {
            "name": "jobs",
            "description": "Search for jobs on LinkedIn",
            "options": [
                {"name": "keywords", "description": "Job keywords to search for (e.g., \"intern\", \"software engineer\")", "type": STRING, "required": true},
                {"name": "linkedin_username", "description": "Your LinkedIn username/email", "type": STRING, "required": true},
                {"name": "linkedin_password", "description": "Your LinkedIn password", "type": STRING, "required": true},
                {"name": "num_jobs", "description": "Number of jobs to scrape (default: 56)", "type": INTEGER, "required": false}
            ]
        },
        {
            "name": "rag",
            "description": "Ask the RAG chatbot a question",
            "options": [
                {"name": "question", "description": "Ask question to RAG", "type": STRING, "required": true}
            ]
        }
    ])
}

/// Context that prints replies to stdout, for running commands from a
/// terminal.
#[derive(Debug, Default)]
pub struct ConsoleContext {
    deferred: bool,
}

#[async_trait]
impl CommandContext for ConsoleContext {
    async fn defer(&mut self, ephemeral: bool) -> Result<()> {
        self.deferred = true;
        tracing::debug!("Deferred reply (ephemeral: {ephemeral})");
        Ok(())
    }

    async fn reply(&mut self, content: &str) -> Result<()> {
        println!("{content}");
        Ok(())
    }

    async fn edit_reply(&mut self, content: &str) -> Result<()> {
        if !self.deferred {
            anyhow::bail!("edit_reply called before defer");
        }
        println!("{content}");
        Ok(())
    }
}
