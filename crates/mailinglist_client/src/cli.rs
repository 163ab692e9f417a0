//! Subcommands of the `mailinglist-client` binary.
//!
//! Each subcommand issues RPCs through a [`MailingListClient`] and writes
//! results as JSON to the supplied writer. Any RPC failure ends the command
//! with an error; the binary logs it and exits non-zero.

use crate::{ClientError, MailingListClient};
use clap::Subcommand;
use log::{info, warn};
use mailinglist_core::proto::ErrorKind;
use mailinglist_core::EmailEntry;
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

pub const DEMO_EMAIL: &str = "lots_of_mail@mailmen.gov";
pub const DEMO_CONFIRMED_AT: i64 = 10_000;
/// `(count, page)` pairs listed at the end of the demo.
pub const DEMO_BATCHES: [(i32, i32); 3] = [(5, 1), (3, 2), (3, 3)];

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Register a new address.
    Create { email: String },
    /// Look up one address.
    Get { email: String },
    /// Upsert confirmation and opt-out state for an address.
    Update {
        email: String,
        #[arg(long, help = "Confirmation time in unix seconds")]
        confirmed_at: Option<i64>,
        #[arg(long, help = "Opt the address out")]
        opt_out: bool,
    },
    /// Opt an address out of the list.
    Delete { email: String },
    /// List one page of subscribed addresses.
    Batch {
        #[arg(long, default_value_t = 10)]
        count: i32,
        #[arg(long, default_value_t = 1, help = "1-indexed page")]
        page: i32,
    },
    /// Run the scripted create/update/delete/list sequence.
    Demo {
        #[arg(long, default_value = DEMO_EMAIL)]
        email: String,
        #[arg(
            long,
            help = "Continue with the stored entry when the address is already registered"
        )]
        reuse_existing: bool,
    },
}

#[derive(Debug)]
pub enum CliError {
    Rpc(ClientError),
    Output(std::io::Error),
}

impl CliError {
    pub fn rpc_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Rpc(err) => err.rpc_kind(),
            Self::Output(_) => None,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rpc(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rpc(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<ClientError> for CliError {
    fn from(value: ClientError) -> Self {
        Self::Rpc(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value.into())
    }
}

/// Runs one subcommand, writing its JSON result to `out`.
pub fn run(
    client: &MailingListClient,
    command: Command,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Create { email } => print_entry(out, client.create_email(&email)?),
        Command::Get { email } => print_entry(out, client.get_email(&email)?),
        Command::Update {
            email,
            confirmed_at,
            opt_out,
        } => {
            let entry = EmailEntry {
                id: 0,
                email,
                confirmed_at,
                opt_out,
            };
            print_entry(out, client.update_email(&entry)?)
        }
        Command::Delete { email } => print_entry(out, client.delete_email(&email)?),
        Command::Batch { count, page } => print_json(out, &client.get_email_batch(count, page)?),
        Command::Demo {
            email,
            reuse_existing,
        } => demo(client, &email, reuse_existing, out),
    }
}

/// Create, confirm, opt out, then list [`DEMO_BATCHES`].
///
/// Writes one JSON line per step: `{"step": .., "email_entry": ..}` for the
/// single-entry calls and `{"step": "batch", "count", "page", "email_entries"}`
/// for each listing.
fn demo(
    client: &MailingListClient,
    email: &str,
    reuse_existing: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    info!("create email");
    let created = match client.create_email(email) {
        Ok(entry) => entry,
        Err(err) if reuse_existing && err.rpc_kind() == Some(ErrorKind::Conflict) => {
            warn!("  {email} already registered; continuing with stored entry");
            client.get_email(email)?
        }
        Err(err) => return Err(err.into()),
    };
    log_entry(created.as_ref());
    write_step(out, json!({"step": "create", "email_entry": created}))?;

    let Some(mut entry) = created else {
        return Ok(());
    };

    info!("update email");
    entry.confirm(DEMO_CONFIRMED_AT);
    let updated = client.update_email(&entry)?;
    log_entry(updated.as_ref());
    write_step(out, json!({"step": "update", "email_entry": updated}))?;

    info!("delete email");
    let deleted = client.delete_email(&entry.email)?;
    log_entry(deleted.as_ref());
    write_step(out, json!({"step": "delete", "email_entry": deleted}))?;

    for (count, page) in DEMO_BATCHES {
        info!("get email batch count={count} page={page}");
        let entries = client.get_email_batch(count, page)?;
        let total = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            info!("  item [{} of {}]: {:?}", index + 1, total, entry);
        }
        write_step(
            out,
            json!({"step": "batch", "count": count, "page": page, "email_entries": entries}),
        )?;
    }
    Ok(())
}

fn log_entry(entry: Option<&EmailEntry>) {
    match entry {
        Some(entry) => info!("  response: {entry:?}"),
        None => info!("  email not found"),
    }
}

fn print_entry(out: &mut dyn Write, entry: Option<EmailEntry>) -> Result<(), CliError> {
    if entry.is_none() {
        info!("email not found");
    }
    print_json(out, &entry)
}

fn print_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_step(out: &mut dyn Write, step: serde_json::Value) -> Result<(), CliError> {
    serde_json::to_writer(&mut *out, &step)?;
    writeln!(out)?;
    Ok(())
}
