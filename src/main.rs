use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use url::Url;

mod check;
mod format;
mod sync;

#[derive(Parser)]
struct Synchronizer {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Format {
        #[clap(short, long, value_parser, value_name = "PATH")]
        data_path: PathBuf,
    },
    Check {
        #[clap(short, long, value_parser, value_name = "PATH")]
        data_path: PathBuf,

        #[clap(long)]
        json: bool,
    },
    Sync {
        #[clap(short, long, value_parser, value_name = "PATH")]
        data_path: PathBuf,

        #[clap(long, value_parser, env = "CONTENT_STORE_URL")]
        content_store_url: Url,

        #[clap(long, value_parser, env = "CONTENT_STORE_API_KEY", hide_env_values = true)]
        api_key: SecretString,

        #[clap(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "env-file")]
    dotenvy::dotenv().ok();

    let synchronizer = Synchronizer::parse();

    match synchronizer.command {
        Command::Format { data_path } => format::format(&data_path),
        Command::Check { data_path, json } => check::check(&data_path, json),
        Command::Sync {
            data_path,
            content_store_url,
            api_key,
            dry_run,
        } => {
            sync::sync(
                &data_path,
                sync::SyncOptions {
                    content_store_url,
                    api_key,
                    dry_run,
                },
            )
            .await
        }
    }
}
