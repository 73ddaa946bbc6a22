use std::process::ExitCode;

use clap::Parser;
use do_my_job_lib::settings::{Cli, Settings};

fn main() -> anyhow::Result<ExitCode> {
    let settings = Settings::from_cli(Cli::parse());
    do_my_job_lib::logging::init(&settings.log_path)?;
    tracing::info!(config_dir = %settings.config_dir.display(), "starting");

    let result = do_my_job_lib::run(&settings)?;

    if let Some(message) = &result.message {
        if result.failed {
            eprintln!("{message}");
        } else {
            println!("{message}");
        }
    }
    Ok(if result.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
