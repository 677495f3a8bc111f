// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use drumcode::Entry;

pub struct InfoCommand {
    pub json: bool,
}

impl InfoCommand {
    pub fn execute(self, entry: &Entry) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(entry)?);
        } else {
            println!("{}", entry);
            println!("Published: {}", entry.published);
            println!("URL: {}", entry.url);
        }

        Ok(())
    }
}
