use std::sync::Arc;

use anyhow::Result;
use tracing::warn;
use tsync_config::Config;
use tsync_core::SyncOutcome;
use tsync_engine::{ReconciliationEngine, RunReport, SyncRunner, TracingAuditSink};
use tsync_sources::{AzureBoardsClient, AzureBoardsSettings, HelpdeskClient, SyncCheckpoint};

use super::build_redactor;

pub async fn handle(
    config: &Config,
    dry_run: bool,
    concurrency: Option<usize>,
    json: bool,
) -> Result<()> {
    let timeout = config.sync.request_timeout();
    let redactor = build_redactor(config)?;

    let source = HelpdeskClient::new(
        &config.helpdesk.base_url,
        &config.helpdesk.api_token,
        config.helpdesk.page_size,
        SyncCheckpoint::new(config.helpdesk.checkpoint_file.clone()),
        timeout,
    )?;
    let tracker = AzureBoardsClient::new(tracker_settings(config), timeout)?;
    let engine = ReconciliationEngine::new(Arc::new(tracker), timeout).with_dry_run(dry_run);

    let runner = SyncRunner::new(
        Arc::new(source),
        Arc::new(redactor),
        Arc::new(engine),
        Arc::new(TracingAuditSink),
    )
    .with_concurrency(concurrency.unwrap_or(config.sync.concurrency));

    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; finishing tickets already in flight");
            cancel.cancel();
        }
    });

    let report = runner.run().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, dry_run);
    }

    Ok(())
}

fn tracker_settings(config: &Config) -> AzureBoardsSettings {
    let tracker = &config.tracker;
    AzureBoardsSettings {
        organization: tracker.organization.clone(),
        project: tracker.project.clone(),
        api_version: tracker.api_version.clone(),
        personal_access_token: tracker.personal_access_token.clone(),
        external_id_field: tracker.external_id_field.clone(),
        work_item_type: tracker.work_item_type.clone(),
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let mode = if dry_run { " (dry run)" } else { "" };
    println!("Sync run {} by {}{}", report.run_id, report.run_by, mode);

    for ticket in &report.tickets {
        let detail = match &ticket.outcome {
            SyncOutcome::Created { remote_id } => format!("created #{}", remote_id),
            SyncOutcome::Updated { remote_id } => format!("updated #{}", remote_id),
            SyncOutcome::Skipped { reason } => format!("skipped ({})", reason),
            SyncOutcome::Failed { error } => format!("FAILED: {}", error),
        };
        if ticket.findings > 0 {
            println!("  {}  {}  [{} redacted]", ticket.ticket_id, detail, ticket.findings);
        } else {
            println!("  {}  {}", ticket.ticket_id, detail);
        }
    }

    println!("\n{}", report.summary);
    if report.not_started > 0 {
        println!("  {} ticket(s) not started (cancelled)", report.not_started);
    }
    if !report.checkpoint_committed && report.summary.total + report.not_started > 0 {
        println!("  Checkpoint not advanced; these tickets will be fetched again");
    }
}
