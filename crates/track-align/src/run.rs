//! Batch runner: prepares the directories, runs the engine on a blocking
//! worker and streams its progress back to the async caller.

use crate::Settings;
use std::path::PathBuf;
use tokio::sync::mpsc;
use track_align_lib::{AlignError, Aligner, BatchResult, BatchStatus, Progress, find_track_files};

/// Errors that stop a run before a report exists
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Align(#[from] AlignError),

    #[error("could not create output directory {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("alignment worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("could not encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Process exit code for a finished batch
pub fn exit_code(result: &BatchResult) -> u8 {
    match result.status() {
        BatchStatus::Complete | BatchStatus::Partial => 0,
        BatchStatus::NoAlignmentAchievable => 2,
        BatchStatus::Failed => 3,
    }
}

/// Exit code for a run that failed before producing a report
pub const SETUP_ERROR_EXIT_CODE: u8 = 1;

/// Run one alignment batch as configured by `settings`
///
/// `on_progress` is called on the async side for every notification, in the
/// order the engine produced them.
pub async fn run_batch(
    settings: &Settings,
    mut on_progress: impl FnMut(&Progress),
) -> Result<BatchResult, RunError> {
    let aligner = Aligner::new(settings.lat, settings.lon, settings.radius)?;
    let files = find_track_files(&settings.input)?;

    let output_dir = settings.output_dir();
    std::fs::create_dir_all(&output_dir).map_err(|source| RunError::CreateOutput {
        path: output_dir.clone(),
        source,
    })?;

    tracing::info!(
        "Processing {} GPX files from {} into {}",
        files.len(),
        settings.input.display(),
        output_dir.display()
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<Progress>();
    let worker = tokio::task::spawn_blocking(move || {
        #[cfg(feature = "profiling")]
        profiling::register_thread!("AlignWorker");

        let mut forward = |progress: &Progress| {
            // The receiver only goes away if the caller stopped listening
            let _ = tx.send(progress.clone());
        };
        aligner.compute_batch_files(&files, &output_dir, Some(&mut forward))
    });

    // The channel closes once the worker finishes and drops its sender
    while let Some(progress) = rx.recv().await {
        on_progress(&progress);
    }

    let result = worker.await??;
    Ok(result)
}
