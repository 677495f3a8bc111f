// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use drumcode::{Entry, Player};

pub struct PlayCommand {
    pub fullsize: bool,
}

impl PlayCommand {
    pub fn execute(self, entry: &Entry, player: &Player) -> Result<()> {
        player.play(entry, self.fullsize)
    }
}
