// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use std::fs::File;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use drumcode::{Config, FeedClient, Interrupted, Picker, Player};

mod commands;
use commands::{InfoCommand, PlayCommand};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "drumcode")]
#[command(about = "Play the latest Drumcode video")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Show the latest video info without playing
    #[arg(long)]
    info: bool,

    /// Print the info as JSON
    #[arg(long, requires = "info")]
    json: bool,

    /// Choose interactively among the newest videos
    #[arg(long)]
    pick: bool,

    /// Play at original resolution instead of the configured height
    #[arg(long)]
    fullsize: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging to file (drumcode_debug.log)
    #[arg(long)]
    debug_log: bool,
}

fn init_logging(cli: &Cli) -> Result<()> {
    if cli.debug_log {
        let file = File::create("drumcode_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("drumcode=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = Config::resolve(cli.config.as_deref())?;

    if cli.pick && !std::io::stdin().is_terminal() {
        anyhow::bail!("--pick needs an interactive terminal on stdin");
    }

    let mut client = FeedClient::new(&config.feed.base_url)?;
    client.enable_progress();
    let result = drumcode::aggregate(&client, &config.sources).await;
    client.finish_progress();

    let candidates = match result {
        Ok(candidates) => candidates,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let chosen = if cli.pick {
        match Picker::stdio().pick(&candidates, config.picker.count) {
            Ok(entry) => entry,
            // Terminal mode is already restored at this point
            Err(e) if e.is::<Interrupted>() => std::process::exit(130),
            Err(e) => return Err(e),
        }
    } else {
        &candidates[0]
    };

    if cli.info {
        return InfoCommand { json: cli.json }.execute(chosen);
    }

    let player = Player::new(config.player);
    PlayCommand {
        fullsize: cli.fullsize,
    }
    .execute(chosen, &player)
}
