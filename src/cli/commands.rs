use tracing::info;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::pipeline::RunSummary;

/// One complete run: every configured source, then the notification mailbox.
///
/// Per-source problems are logged and counted in the summary; only failures
/// that prevent the run from starting (bad credentials setup, server bind)
/// come back as errors.
pub async fn run(config: Config, dry_run: bool) -> Result<RunSummary> {
    let ctx = AppContext::new(config)?;
    info!(data_dir = %ctx.data_dir.display(), dry_run, "Starting run");

    let pipeline = ctx.pipeline(dry_run).await?;
    if let Some(server) = pipeline.server() {
        info!(addr = %server.local_addr(), "Content server listening");
    }

    let mut summary = RunSummary::default();
    pipeline
        .run_sources(&ctx.config.sources(), &mut summary)
        .await;

    if let Some(mailbox) = &ctx.mailbox {
        pipeline.run_mailbox(mailbox, &mut summary).await;
    }

    pipeline.finish().await;

    println!("{}", summary);
    Ok(summary)
}
