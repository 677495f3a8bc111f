// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use tracing::warn;

const DEFAULT_COLUMNS: usize = 80;

/// Terminal mode control used by the picker.
pub trait RawTerminal {
    fn enable_raw_mode(&mut self) -> Result<()>;
    fn disable_raw_mode(&mut self) -> Result<()>;
    /// Current width in columns.
    fn columns(&self) -> usize;
}

/// The controlling terminal, via crossterm.
#[derive(Debug, Default)]
pub struct SystemTerminal;

impl RawTerminal for SystemTerminal {
    fn enable_raw_mode(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode().context("Failed to enable raw mode")
    }

    fn disable_raw_mode(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode().context("Failed to restore terminal mode")
    }

    fn columns(&self) -> usize {
        terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .filter(|&w| w > 0)
            .unwrap_or(DEFAULT_COLUMNS)
    }
}

/// Holds raw mode for its lifetime and restores the previous mode exactly
/// once when dropped.
pub struct RawModeGuard<'a, T: RawTerminal> {
    terminal: &'a mut T,
}

impl<'a, T: RawTerminal> RawModeGuard<'a, T> {
    pub fn acquire(terminal: &'a mut T) -> Result<Self> {
        terminal.enable_raw_mode()?;
        Ok(Self { terminal })
    }

    pub fn columns(&self) -> usize {
        self.terminal.columns()
    }
}

impl<T: RawTerminal> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.disable_raw_mode() {
            warn!("{:#}", e);
        }
    }
}
