// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use std::io::Read;

const ETX: u8 = 0x03;
const LF: u8 = b'\n';
const CR: u8 = b'\r';
const ESC: u8 = 0x1b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Confirm,
    Interrupt,
    Up,
    Down,
    Ignored,
}

/// Read one key from a raw-mode byte stream.
///
/// An escape byte always consumes exactly two more bytes; only `[A` and
/// `[B` mean anything.
pub fn read_key<R: Read>(input: &mut R) -> Result<Key> {
    let key = match read_byte(input)? {
        CR | LF => Key::Confirm,
        ETX => Key::Interrupt,
        ESC => match [read_byte(input)?, read_byte(input)?] {
            [b'[', b'A'] => Key::Up,
            [b'[', b'B'] => Key::Down,
            _ => Key::Ignored,
        },
        _ => Key::Ignored,
    };
    Ok(key)
}

fn read_byte<R: Read>(input: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    input
        .read_exact(&mut buf)
        .context("Unexpected end of input while waiting for a key")?;
    Ok(buf[0])
}
