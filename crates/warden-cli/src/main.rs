// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Warden command-line permission checker.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_server_config::{LogFormat, LoggingConfig};
use warden_server_permission::{CancellationToken, PermissionError, PermissionRequest};

mod service;

/// Exit code for a permitted request.
const EXIT_PERMITTED: u8 = 0;
/// Exit code for a denial verdict (policy or domain lock).
const EXIT_DENIED: u8 = 1;
/// Exit code for invalid input, cancellation, or configuration problems.
const EXIT_INVALID: u8 = 2;

/// Warden - evaluate permission requests against the configured rule set.
#[derive(Parser, Debug)]
#[command(name = "warden", about = "Warden permission checker", version)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Check whether a request is permitted
	Check(CheckArgs),
	/// Show version information
	Version,
}

#[derive(Args, Debug)]
struct CheckArgs {
	/// Config file (defaults to /etc/warden/server.toml)
	#[arg(long, env = "WARDEN_CONFIG")]
	config: Option<PathBuf>,

	/// Full request as JSON; overrides the individual flags
	#[arg(long, conflicts_with_all = ["user", "object_type", "object_idx", "sub_resource"])]
	request: Option<String>,

	#[arg(long)]
	user: Option<i64>,

	#[arg(long)]
	object_type: Option<String>,

	#[arg(long)]
	object_idx: Option<String>,

	#[arg(long)]
	sub_resource: Option<String>,

	/// Requested action; repeat for several
	#[arg(long = "act")]
	acts: Vec<String>,

	#[arg(long)]
	domain_type: Option<String>,

	#[arg(long)]
	domain_id: Option<String>,

	/// Abort the check after this many milliseconds
	#[arg(long)]
	timeout_ms: Option<u64>,
}

impl CheckArgs {
	fn to_request(&self) -> anyhow::Result<PermissionRequest> {
		if let Some(json) = &self.request {
			return serde_json::from_str(json).context("failed to parse --request JSON");
		}

		Ok(PermissionRequest {
			user_id: self.user.unwrap_or_default(),
			object_type: self.object_type.clone().unwrap_or_default(),
			object_idx: self.object_idx.clone().unwrap_or_default(),
			sub_resource: self.sub_resource.clone().unwrap_or_default(),
			acts: self.acts.clone(),
			domain_type: self.domain_type.clone().unwrap_or_default(),
			domain_id: self.domain_id.clone().unwrap_or_default(),
		})
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

fn exit_code_for(result: &Result<(), PermissionError>) -> u8 {
	match result {
		Ok(()) => EXIT_PERMITTED,
		Err(e) if e.is_denial() => EXIT_DENIED,
		Err(_) => EXIT_INVALID,
	}
}

async fn run_check(args: CheckArgs) -> anyhow::Result<u8> {
	let config = match &args.config {
		Some(path) => warden_server_config::load_config_with_file(path),
		None => warden_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	init_tracing(&config.logging);

	let request = args.to_request()?;
	let service = service::build_service(&config);

	let cancel = CancellationToken::new();
	if let Some(ms) = args.timeout_ms {
		let deadline = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(ms)).await;
			deadline.cancel();
		});
	}

	let result = service.check_with_cancel(&request, &cancel).await;
	match &result {
		Ok(()) => println!("permitted"),
		Err(e) => println!("denied: {e}"),
	}
	Ok(exit_code_for(&result))
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	match cli.command {
		Command::Version => {
			println!("warden {}", env!("CARGO_PKG_VERSION"));
			ExitCode::SUCCESS
		}
		Command::Check(args) => match run_check(args).await {
			Ok(code) => ExitCode::from(code),
			Err(e) => {
				eprintln!("error: {e:#}");
				ExitCode::from(EXIT_INVALID)
			}
		},
	}
}
