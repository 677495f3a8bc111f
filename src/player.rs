// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::config::PlayerConfig;
use crate::feed::Entry;
use anyhow::{Context, Result};
use std::process::Command;
use tracing::debug;

pub struct Player {
    config: PlayerConfig,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the player, URL last.
    pub fn command_args(&self, url: &str, fullsize: bool) -> Vec<String> {
        let mut args = self.config.args.clone();
        if !fullsize {
            args.push(format!("--autofit=x{}", self.config.autofit_height));
        }
        args.push(url.to_string());
        args
    }

    /// Run the player in the foreground and wait for it to exit.
    ///
    /// Only a failure to start the player is an error; its exit status is
    /// left alone.
    pub fn play(&self, entry: &Entry, fullsize: bool) -> Result<()> {
        println!("[{}] Playing: {}", entry.source_label, entry.title);

        let args = self.command_args(&entry.url, fullsize);
        debug!("Starting player: {} {}", self.config.command, args.join(" "));

        let status = Command::new(&self.config.command)
            .args(&args)
            .status()
            .with_context(|| {
                format!("Failed to execute player command: {}", self.config.command)
            })?;

        debug!("Player exited with {}", status);
        Ok(())
    }
}
