//! Caption run: progress bar, dataset and report output, summary.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, Instant};

use visionforge_core::export::{render_report, write_dataset};
use visionforge_core::{ItemCollection, ItemStatus, ProgressEvent, RunSummary, StatsSnapshot};

use super::setup::CaptionSession;

/// Run the session, write outputs and print a summary.
pub async fn run_session(mut session: CaptionSession) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let summary = run_pass(&mut session).await;

    let stats = StatsSnapshot::from_items(&session.items);
    let written = write_outputs(&session, &stats)?;
    print_summary(&summary, &stats, written, &session, start_time.elapsed());

    if summary.succeeded == 0 && summary.queued > 0 {
        anyhow::bail!("No image was captioned successfully");
    }
    Ok(())
}

/// One orchestrator pass with a progress bar.
async fn run_pass(session: &mut CaptionSession) -> RunSummary {
    let queued = session.items.eligible_ids().len() as u64;
    let progress = create_progress_bar(queued);
    let mut failed = 0u64;

    let summary = session
        .orchestrator
        .run(
            &mut session.items,
            &session.prompt,
            &session.options,
            |event| match event {
                ProgressEvent::ItemStarted { .. } => {}
                ProgressEvent::ItemFinished { status, error, .. } => {
                    if *status == ItemStatus::Error {
                        failed += 1;
                        if let Some(error) = error {
                            progress.println(format!("  failed: {error}"));
                        }
                    }
                    progress.inc(1);
                    progress.set_message(format!("{failed} failed"));
                }
            },
        )
        .await;

    progress.finish_and_clear();
    summary
}

/// Write the dataset and, unless disabled, the report. Returns the number of
/// dataset records written.
fn write_outputs(session: &CaptionSession, stats: &StatsSnapshot) -> anyhow::Result<usize> {
    let written = write_dataset_file(&session.dataset_path, &session.items)?;
    tracing::info!("Dataset written to {:?}", session.dataset_path);

    if let Some(report_path) = &session.report_path {
        std::fs::write(report_path, render_report(stats, chrono::Local::now()))?;
        tracing::info!("Report written to {:?}", report_path);
    }

    Ok(written)
}

fn write_dataset_file(path: &Path, items: &ItemCollection) -> anyhow::Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    Ok(write_dataset(BufWriter::new(file), items)?)
}

/// Create a progress bar for the caption run.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(
    summary: &RunSummary,
    stats: &StatsSnapshot,
    written: usize,
    session: &CaptionSession,
    elapsed: Duration,
) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Provider:     {:>8}", session.provider.kind.as_str());
    eprintln!("    Model:        {}", session.provider.model);
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    let skipped = session.items.len().saturating_sub(summary.queued);
    if skipped > 0 {
        eprintln!("    Skipped:      {:>8}", skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Captioned:    {:>8}", stats.total_processed);
    eprintln!("    Avg time:     {:>7.0}ms", stats.average_time_ms);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Records:      {:>8}", written);
    let top: Vec<String> = stats
        .top_tags(5)
        .into_iter()
        .map(|(tag, count)| format!("{tag} ({count})"))
        .collect();
    if !top.is_empty() {
        eprintln!("    Top tags:     {}", top.join(", "));
    }
    eprintln!("  ====================================");

    for failure in &summary.failures {
        eprintln!("    {}: {}", failure.file_name, failure.message);
    }
}
