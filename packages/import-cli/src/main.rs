//! Command-line front end for the salon data-import job service.
//!
//! The client library is deliberately policy-free; this binary owns the
//! caller-side decisions: polling cadence, give-up ceiling, and exit codes.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use import_client::{ImportClient, ImportJob, JobStatus, Provider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "import", about = "Submit and track salon data-import jobs")]
struct Cli {
    /// Base URL of the import service
    #[arg(long, env = "IMPORT_API_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Bearer token. An absent token is still sent (empty) so the server can
    /// reject it explicitly.
    #[arg(long, env = "IMPORT_API_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Import provider (dikidi or zapisikz)
    #[arg(long, env = "IMPORT_PROVIDER", default_value = "zapisikz")]
    provider: Provider,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a file and start an import job
    Upload {
        /// File to import (e.g. an exported .xlsx or .csv)
        path: PathBuf,
        /// Branch (location) the imported data belongs to
        #[arg(long)]
        branch: Option<String>,
    },
    /// Query a job's status once
    Status { job_id: String },
    /// Poll a job until it reaches a terminal state
    Watch {
        job_id: String,
        /// Seconds between polls
        #[arg(long, default_value_t = 3)]
        interval: u64,
        /// Give up after this many polls
        #[arg(long, default_value_t = 100)]
        max_attempts: u32,
    },
    /// List submitted jobs
    Jobs,
    /// Delete a job from the registry
    Delete { job_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,import_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let client = ImportClient::new(&cli.url, cli.provider, &cli.token);

    match cli.command {
        Command::Upload { path, branch } => {
            let job = client
                .upload_path(&path, branch.as_deref())
                .await
                .with_context(|| format!("uploading {}", path.display()))?;
            println!(
                "{} job {} ({})",
                "submitted".green().bold(),
                job.job_id.bold(),
                job.file_name.as_deref().unwrap_or("?")
            );
            println!("track it with: import watch {}", job.job_id);
        }
        Command::Status { job_id } => {
            let job = client.status(&job_id).await?;
            print_job(&job);
            print_stats(&job);
        }
        Command::Watch {
            job_id,
            interval,
            max_attempts,
        } => {
            watch(&client, &job_id, interval, max_attempts).await?;
        }
        Command::Jobs => {
            let list = client.list_jobs().await?;
            println!("{} job(s)", list.total_jobs);
            for job in &list.jobs {
                print_job(job);
            }
        }
        Command::Delete { job_id } => {
            let message = client.delete_job(&job_id).await?;
            println!("{} {}", "deleted".green().bold(), message);
        }
    }

    Ok(())
}

/// Fixed-interval polling with a give-up ceiling. The server owns the status;
/// we only observe it, but a backwards transition is worth flagging loudly.
async fn watch(client: &ImportClient, job_id: &str, interval: u64, max_attempts: u32) -> Result<()> {
    let mut last: Option<JobStatus> = None;

    for _ in 0..max_attempts {
        let job = client
            .status(job_id)
            .await
            .with_context(|| format!("polling job {job_id}"))?;

        if let Some(prev) = last {
            if job.status != prev && !prev.can_transition_to(job.status) {
                eprintln!(
                    "{} job {} went {} -> {}",
                    "warning: status moved backwards:".yellow().bold(),
                    job_id,
                    prev,
                    job.status
                );
            }
        }
        if last != Some(job.status) {
            print_job(&job);
        }
        last = Some(job.status);

        if job.status.is_terminal() {
            print_stats(&job);
            if job.status == JobStatus::Failed {
                bail!("import job {job_id} failed");
            }
            return Ok(());
        }

        tokio::time::sleep(Duration::from_secs(interval)).await;
    }

    match last {
        Some(status) => bail!("gave up on job {job_id} after {max_attempts} polls (still {status})"),
        None => bail!("gave up on job {job_id} before any poll (max attempts is 0)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watch_with_zero_attempts_reports_never_polled() {
        // Nothing listens here; with zero attempts no request is ever made,
        // so the error must be the give-up message, not a transport failure.
        let client = ImportClient::new("http://127.0.0.1:1", Provider::Zapisikz, "");

        let err = watch(&client, "abc123", 1, 0).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("before any poll"), "got: {message}");
    }
}

fn print_job(job: &ImportJob) {
    let status = match job.status {
        JobStatus::Pending => "pending".yellow(),
        JobStatus::Processing => "processing".cyan(),
        JobStatus::Completed => "completed".green(),
        JobStatus::Failed => "failed".red(),
    };
    let mut line = format!("{}  {}", job.job_id.bold(), status);
    if let Some(name) = &job.file_name {
        line.push_str(&format!("  {name}"));
    }
    if let Some(branch) = &job.branch_id {
        line.push_str(&format!("  branch={branch}"));
    }
    if let (Some(start), Some(end)) = (job.start_time, job.end_time) {
        line.push_str(&format!("  took {}s", (end - start).num_seconds()));
    }
    println!("{line}");
}

fn print_stats(job: &ImportJob) {
    let Some(stats) = &job.stats else {
        return;
    };
    println!(
        "  bookings {}  clients {}  services {}  skipped {}  duplicates {}",
        stats.bookings_created,
        stats.clients_created,
        stats.services_created,
        stats.skipped,
        stats.duplicates
    );
    for error in &stats.errors {
        println!("  {} {error}", "error:".red());
    }
}
