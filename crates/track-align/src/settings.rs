use clap::Parser;
use std::path::{Path, PathBuf};

/// Alignment point used when none is given on the command line
pub const DEFAULT_LATITUDE: f64 = 21.270889;
pub const DEFAULT_LONGITUDE: f64 = -157.71612;
pub const DEFAULT_RADIUS_METERS: f64 = 200.0;

/// Suffix appended to the input directory name when no output directory is given
const OUTPUT_SUFFIX: &str = "_aligned";

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
#[clap(allow_negative_numbers = true)]
/// Track Align - shift the timestamps of a folder of GPX tracks so they all
/// pass a reference point at the same moment
pub struct Settings {
    /// Latitude of the alignment point in degrees (-90 to 90)
    #[clap(long, default_value_t = DEFAULT_LATITUDE)]
    pub lat: f64,

    /// Longitude of the alignment point in degrees (-180 to 180)
    #[clap(long, default_value_t = DEFAULT_LONGITUDE)]
    pub lon: f64,

    /// Search radius around the alignment point in meters
    #[clap(short, long, default_value_t = DEFAULT_RADIUS_METERS)]
    pub radius: f64,

    /// Folder holding the GPX files to align
    #[clap(short, long, value_name = "DIR", default_value = "./in")]
    pub input: PathBuf,

    /// Folder receiving the aligned copies [default: <INPUT>_aligned]
    #[clap(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Print the final report as JSON instead of text
    #[clap(long, default_value = "false")]
    pub json: bool,

    /// Do not print a line per file while the batch runs
    #[clap(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Settings {
    /// Parse the process arguments, exiting with usage information on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(settings) => settings,
            Err(e) => e.exit(),
        }
    }

    /// The output directory, derived from the input directory when not given
    pub fn output_dir(&self) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => default_output_dir(&self.input),
        }
    }
}

fn default_output_dir(input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => input.with_file_name(format!("{}{OUTPUT_SUFFIX}", name.to_string_lossy())),
        None => input.join(OUTPUT_SUFFIX.trim_start_matches('_')),
    }
}
