//! Command-line caller for the mailing list RPC service.

use clap::Parser;
use log::error;
use mailinglist_client::cli::{run, Command};
use mailinglist_client::{MailingListClient, DEFAULT_ENDPOINT};
use mailinglist_core::init_logging;
use std::process::ExitCode;
use std::time::Duration;

const PROGRAM: &str = "mailinglist-client";

#[derive(Parser)]
#[command(
    name = "mailinglist-client",
    version,
    about = "Call the mailing list RPC service",
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        env = "MAILINGLIST_RPC_ADDR",
        default_value = DEFAULT_ENDPOINT,
        help = "Server endpoint (http://host:port, host:port or :port)"
    )]
    rpc_addr: String,
    #[arg(long, default_value_t = 1_000, help = "Per-call deadline in milliseconds")]
    timeout_ms: u64,
    #[arg(long, default_value = "info", help = "trace|debug|info|warn|error")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(PROGRAM, &cli.log_level, None) {
        eprintln!("{PROGRAM}: {err}");
        return ExitCode::FAILURE;
    }

    let client = match MailingListClient::with_timeout(
        &cli.rpc_addr,
        Duration::from_millis(cli.timeout_ms),
    ) {
        Ok(client) => client,
        Err(err) => {
            error!("event=client_init module=cli status=error error={err}");
            return ExitCode::from(2);
        }
    };

    let stdout = std::io::stdout();
    match run(&client, cli.command, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=rpc_failed module=cli status=error error={err}");
            ExitCode::FAILURE
        }
    }
}
