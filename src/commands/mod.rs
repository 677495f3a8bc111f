// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod info;
pub mod play;

pub use info::InfoCommand;
pub use play::PlayCommand;
