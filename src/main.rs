mod cli;
mod config;
mod copy;
mod ecr;
mod error;
mod options;
mod path;
mod store;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Args, EcrCommand, S3Command, Service};
use copy::s3_copy;
use ecr::ecr_get_login;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr; stdout carries copied bytes and login lines.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let result = match args.service {
        Service::S3 {
            command: S3Command::Cp { src, dst },
        } => s3_copy(&src, &dst).await,
        Service::Ecr {
            command: EcrCommand::GetLogin { options },
        } => ecr_get_login(&options).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {}", env!("CARGO_PKG_NAME"), e);
        std::process::exit(e.exit_code());
    }
}
