use std::process::ExitCode;
use track_align::{RunError, SETUP_ERROR_EXIT_CODE, Settings, exit_code, logging, render, run_batch};
use track_align_lib::BatchResult;

fn main() -> ExitCode {
    // Subscriber first, before the runtime spawns any thread
    logging::setup_logging();
    logging::log_version_info();

    let settings = Settings::from_cli();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            return ExitCode::from(SETUP_ERROR_EXIT_CODE);
        }
    };

    match runtime.block_on(run(&settings)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(SETUP_ERROR_EXIT_CODE)
        }
    }
}

async fn run(settings: &Settings) -> Result<u8, RunError> {
    tracing::info!(
        "Alignment point: {}, {} (radius {} m)",
        settings.lat,
        settings.lon,
        settings.radius
    );

    let quiet = settings.quiet || settings.json;
    let result = run_batch(settings, |progress| {
        if !quiet {
            println!("{}", render::progress_line(progress));
        }
    })
    .await?;

    print_report(settings, &result)?;
    Ok(exit_code(&result))
}

fn print_report(settings: &Settings, result: &BatchResult) -> Result<(), RunError> {
    if settings.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!();
        print!("{}", render::summary(result, &settings.output_dir()));
    }
    Ok(())
}
