//! Text rendering of progress notifications and the final report

use std::fmt;
use std::path::Path;
use track_align_lib::utils::format_offset;
use track_align_lib::{BatchResult, BatchStatus, FileReport, FileStatus, Phase, Progress};

const RULE_WIDTH: usize = 50;

/// One line per file and pass, e.g. `[2/5] Aligned b.gpx (offset: +0:00:14)`
pub fn progress_line(progress: &Progress) -> String {
    let position = format!("[{}/{}]", progress.index + 1, progress.total);
    let name = &progress.file_name;

    match (&progress.status, progress.phase) {
        (FileStatus::CrossingFound { time, distance_meters }, _) => {
            format!("{position} {name}: found alignment point at {time} ({distance_meters:.1} m)")
        }
        (FileStatus::Aligned { time_offset }, _) => {
            format!("{position} Aligned {name} (offset: {})", format_offset(*time_offset))
        }
        (FileStatus::Failed(reason), Phase::Discovery) => format!("{position} {name}: {reason}"),
        (FileStatus::Failed(reason), Phase::Emit) => {
            format!("{position} Failed to align {name}: {reason}")
        }
    }
}

/// Human readable summary of a finished batch
pub fn summary(result: &BatchResult, output_dir: &Path) -> String {
    Summary { result, output_dir }.to_string()
}

/// Display adapter rendering a [`BatchResult`] as the end-of-run report
pub struct Summary<'a> {
    pub result: &'a BatchResult,
    pub output_dir: &'a Path,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{rule}\nALIGNMENT RESULTS\n{rule}")?;
        writeln!(f, "Files processed: {}", result.processed)?;
        writeln!(f, "Successfully aligned: {}", result.succeeded)?;
        writeln!(f, "Failed: {}", result.failed)?;
        match result.reference_time {
            Some(reference) => writeln!(f, "Reference time: {reference}")?,
            None => writeln!(f, "Reference time: none")?,
        }

        match result.status() {
            BatchStatus::NoAlignmentAchievable => writeln!(
                f,
                "\nNo file passes within the search radius of the alignment point; nothing was written."
            )?,
            BatchStatus::Failed => {
                writeln!(f, "\nNo aligned file could be written; see the failures below.")?
            }
            BatchStatus::Complete | BatchStatus::Partial => {
                writeln!(f, "\nAligned files saved to: {}", self.output_dir.display())?
            }
        }

        if result.aligned().next().is_some() {
            writeln!(f, "\nTime offsets (subtracted from each file):")?;
            for (name, report) in result.aligned() {
                if let FileReport::Aligned {
                    time_offset,
                    original_crossing_time,
                    ..
                } = report
                {
                    writeln!(
                        f,
                        "  {name}: {} (crossed at {original_crossing_time})",
                        format_offset(*time_offset)
                    )?;
                }
            }
        }

        if result.failures().next().is_some() {
            writeln!(f, "\nFailures:")?;
            for (name, reason) in result.failures() {
                writeln!(f, "  {name}: {reason}")?;
            }
        }

        Ok(())
    }
}
