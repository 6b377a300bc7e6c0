//! Command line host for track-align-lib
//!
//! Parses the settings, sets up logging, runs the alignment batch on a
//! blocking worker and renders progress and the final report.

pub mod logging;
pub mod render;
pub mod run;
pub mod settings;

pub use run::{RunError, SETUP_ERROR_EXIT_CODE, exit_code, run_batch};
pub use settings::Settings;
