use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod tools;
mod ui;

use cli::{Cli, Commands};
use commands::{build, containerize, publish, publish_all, release, tag, version};
use services::ReleaseOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.global.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global;
    let result = match cli.command {
        Commands::Version => version::execute(global).await,
        Commands::Build { platform, output } => build::execute(global, platform, output).await,
        Commands::Containerize { platform } => containerize::execute(global, platform).await,
        Commands::Tag { dev } => tag::execute(global, dev).await,
        Commands::Publish { platform, registry } => {
            publish::execute(global, platform, registry).await
        }
        Commands::PublishAll {
            platforms,
            registry,
        } => publish_all::execute(global, platforms, registry).await,
        Commands::Release {
            dev,
            skip_tag,
            platforms,
            registry,
            json,
        } => {
            release::execute(
                global,
                platforms,
                registry,
                ReleaseOptions {
                    dev,
                    skip_tag,
                    quiet: json,
                },
                json,
            )
            .await
        }
    };

    if let Err(e) = result {
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
