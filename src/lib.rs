// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod aggregate;
pub mod config;
pub mod feed;
pub mod picker;
pub mod player;

pub use aggregate::{NoCandidates, aggregate};
pub use config::Config;
pub use feed::{Entry, FeedClient};
pub use picker::{Interrupted, Picker};
pub use player::Player;
