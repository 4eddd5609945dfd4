//! `/echo text` — round-trips a message through the backend. Not deferred.

use anyhow::Result;
use tracing::warn;

use super::{error_reply, fit_to_budget, CommandContext};
use crate::backend_client::JobsBackend;

pub async fn handle(
    backend: &dyn JobsBackend,
    text: &str,
    ctx: &mut dyn CommandContext,
) -> Result<()> {
    let reply = match backend.echo(text).await {
        Ok(response) => response.response,
        Err(e) => {
            warn!("/echo failed: {e}");
            error_reply(&e)
        }
    };
    ctx.reply(&fit_to_budget(reply)).await
}
