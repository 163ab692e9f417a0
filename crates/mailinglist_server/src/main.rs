//! Mailing list RPC server entry point.

use clap::Parser;
use log::error;
use mailinglist_core::{default_log_level, init_logging};
use mailinglist_server::{serve, ServerArgs};
use std::process::ExitCode;

const PROGRAM: &str = "mailinglist-server";

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();

    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(PROGRAM, level, args.log_dir.as_deref()) {
        eprintln!("{PROGRAM}: {err}");
        return ExitCode::FAILURE;
    }

    let config = match args.to_config() {
        Ok(config) => config,
        Err(err) => {
            error!("event=config module=main status=error error={err}");
            eprintln!("{PROGRAM}: {err}");
            return ExitCode::from(2);
        }
    };

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=main status=error error={err}");
            eprintln!("{PROGRAM}: {err}");
            ExitCode::FAILURE
        }
    }
}
