// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Inline list picker.
//!
//! Draws a fixed block of lines below the cursor and redraws it in place
//! as the selection moves, so nothing is cleared and scrollback is left
//! alone.

pub mod event;
pub mod terminal;

use crate::feed::Entry;
use anyhow::Result;
use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::borrow::Cow;
use std::io::{self, Read, Write};
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub use event::{Key, read_key};
pub use terminal::{RawModeGuard, RawTerminal, SystemTerminal};

const SELECTED_PREFIX: &str = "❯ ";
const PLAIN_PREFIX: &str = "  ";
const ELLIPSIS: char = '…';

/// The user pressed Ctrl+C while picking.
#[derive(Debug)]
pub struct Interrupted;

impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted")
    }
}

impl std::error::Error for Interrupted {}

pub struct Picker<R, W, T> {
    input: R,
    output: W,
    terminal: T,
}

impl Picker<io::Stdin, io::Stdout, SystemTerminal> {
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout(), SystemTerminal)
    }
}

impl<R: Read, W: Write, T: RawTerminal> Picker<R, W, T> {
    pub fn new(input: R, output: W, terminal: T) -> Self {
        Self {
            input,
            output,
            terminal,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// Let the user choose among the first `top_n` candidates.
    ///
    /// Raw mode is held only while the loop runs and is restored on every
    /// way out, including [`Interrupted`] and I/O errors.
    pub fn pick<'a>(&mut self, candidates: &'a [Entry], top_n: usize) -> Result<&'a Entry> {
        let visible = &candidates[..top_n.min(candidates.len())];
        if visible.is_empty() {
            anyhow::bail!("Nothing to pick from");
        }

        let guard = RawModeGuard::acquire(&mut self.terminal)?;
        let count = visible.len();
        let mut cursor = 0;

        render(&mut self.output, visible, cursor, guard.columns(), false)?;

        loop {
            cursor = match read_key(&mut self.input)? {
                Key::Confirm => break,
                Key::Interrupt => return Err(Interrupted.into()),
                Key::Up => (cursor + count - 1) % count,
                Key::Down => (cursor + 1) % count,
                // No state change, no redraw
                Key::Ignored => continue,
            };

            render(&mut self.output, visible, cursor, guard.columns(), true)?;
        }

        debug!("Picked candidate {} of {}", cursor, count);
        drop(guard);
        Ok(&visible[cursor])
    }
}

fn line_text(entry: &Entry) -> String {
    let date = entry.published.get(..10).unwrap_or(&entry.published);
    if date.is_empty() {
        format!("[{}] {}", entry.source_label, entry.title)
    } else {
        format!("[{}] {} ({})", entry.source_label, entry.title, date)
    }
}

/// Cut `text` to at most `columns` display columns, ending in an ellipsis
/// when anything was removed.
pub fn truncate_to_width(text: &str, columns: usize) -> Cow<'_, str> {
    if text.width() <= columns {
        return Cow::Borrowed(text);
    }

    let budget = columns.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

fn render<W: Write>(
    out: &mut W,
    entries: &[Entry],
    cursor: usize,
    columns: usize,
    redraw: bool,
) -> io::Result<()> {
    if redraw {
        queue!(out, MoveUp(u16::try_from(entries.len()).unwrap_or(u16::MAX)))?;
    }

    for (i, entry) in entries.iter().enumerate() {
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;

        if i == cursor {
            let line = format!("{}{}", SELECTED_PREFIX, line_text(entry));
            queue!(
                out,
                SetForegroundColor(Color::Cyan),
                SetAttribute(Attribute::Bold),
                Print(truncate_to_width(&line, columns)),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        } else {
            let line = format!("{}{}", PLAIN_PREFIX, line_text(entry));
            queue!(out, Print(truncate_to_width(&line, columns)))?;
        }

        // Raw mode turns off output post-processing, so return explicitly
        queue!(out, Print("\r\n"))?;
    }

    out.flush()
}
