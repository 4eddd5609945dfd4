//! `/rag question` — asks the knowledge-base chatbot and shows the answer
//! with its top matches and sources. Deferred.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::{error_reply, fit_to_budget, CommandContext};
use crate::backend_client::JobsBackend;
use crate::models::chat::RagResponse;

const MATCHES_SHOWN: usize = 3;
const MATCH_PREVIEW_CHARS: usize = 200;

/// Some model backends return the message repr, e.g. `content='...' id=...`.
static RE_CONTENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"content='([^']+)'").unwrap());

pub async fn handle(
    backend: &dyn JobsBackend,
    question: &str,
    ctx: &mut dyn CommandContext,
) -> Result<()> {
    ctx.defer(false).await?;

    let reply = match backend.rag(question).await {
        Ok(response) => format_answer(question, &response),
        Err(e) => {
            warn!("/rag failed: {e}");
            error_reply(&e)
        }
    };
    ctx.edit_reply(&fit_to_budget(reply)).await
}

/// Returns the text inside `content='...'` when present, else the input.
pub fn unwrap_content(answer: &str) -> &str {
    RE_CONTENT
        .captures(answer)
        .and_then(|caps| caps.get(1))
        .map_or(answer, |m| m.as_str())
}

fn format_answer(question: &str, response: &RagResponse) -> String {
    let mut reply = format!(
        "**Q:** {question}\n**A:** {}\n\n",
        unwrap_content(&response.response)
    );

    if !response.matches.is_empty() {
        reply.push_str("__**Thinking Process:**__\n");
        for (idx, m) in response.matches.iter().take(MATCHES_SHOWN).enumerate() {
            let preview: String = m.content.chars().take(MATCH_PREVIEW_CHARS).collect();
            reply.push_str(&format!("**[{}]**\n", idx + 1));
            reply.push_str(&format!("> **Score:** {:.2}\n", m.score));
            reply.push_str(&format!("> **Source:** {}\n", m.source().unwrap_or("N/A")));
            reply.push_str(&format!("> **Content:** {preview}\n\n"));
        }
    }

    let sources: Vec<&str> = response
        .sources
        .iter()
        .flatten()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if !sources.is_empty() {
        reply.push_str("**Sources:**\n");
        let lines: Vec<String> = sources
            .iter()
            .enumerate()
            .map(|(idx, src)| format!("> [{}] {src}", idx + 1))
            .collect();
        reply.push_str(&lines.join("\n"));
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend_client::fake::{FakeBackend, Scripted};
    use crate::backend_client::BackendClient;
    use crate::bot::test_support::{RecordingContext, Sent};
    use crate::bot::CONTACT_FAILURE_REPLY;
    use crate::models::chat::RagMatch;
    use serde_json::{json, Map};
    use std::time::Duration;

    fn rag_match(score: f64, source: Option<&str>, content: &str) -> RagMatch {
        let mut metadata = Map::new();
        if let Some(source) = source {
            metadata.insert("source".to_string(), json!(source));
        }
        RagMatch {
            content: content.to_string(),
            score,
            metadata,
        }
    }

    #[test]
    fn test_unwrap_content_extracts_inner_text() {
        assert_eq!(
            unwrap_content("content='Office hours are Fridays.' additional_kwargs={}"),
            "Office hours are Fridays."
        );
        assert_eq!(unwrap_content("plain answer"), "plain answer");
    }

    #[tokio::test]
    async fn test_answer_with_matches_and_sources() {
        let backend = FakeBackend::new();
        FakeBackend::push(
            &backend.rags,
            Scripted::Ok(RagResponse {
                response: "content='Cohorts start in May.'".to_string(),
                matches: vec![
                    rag_match(0.8731, Some("faq.md"), &"c".repeat(300)),
                    rag_match(0.5, None, "short"),
                    rag_match(0.4, Some("a.md"), "third"),
                    rag_match(0.1, Some("b.md"), "fourth"),
                ],
                sources: vec![Some("faq.md".to_string()), None, Some(String::new())],
            }),
        );
        let mut ctx = RecordingContext::default();

        handle(&backend, "When do cohorts start?", &mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.sent[0], Sent::Defer { ephemeral: false });
        let text = ctx.last_text();
        assert!(text.starts_with("**Q:** When do cohorts start?\n**A:** Cohorts start in May.\n\n"));
        assert!(text.contains("> **Score:** 0.87\n> **Source:** faq.md"));
        assert!(text.contains("> **Source:** N/A"));
        assert!(text.contains(&format!("> **Content:** {}\n", "c".repeat(200))));
        assert!(!text.contains("fourth"));
        assert!(text.ends_with("**Sources:**\n> [1] faq.md"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_gets_fixed_reply() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = BackendClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let mut ctx = RecordingContext::default();

        handle(&backend, "hello?", &mut ctx).await.unwrap();

        assert_eq!(ctx.last_text(), CONTACT_FAILURE_REPLY);
    }
}
