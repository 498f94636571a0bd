// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Remedy CLI

pub mod batch;
pub mod config;
pub mod feedback;
pub mod fix;
pub mod serve;
pub mod stats;

pub use self::batch::BatchArgs;
pub use self::config::ConfigCommand;
pub use self::feedback::FeedbackArgs;
pub use self::fix::FixArgs;
pub use self::serve::ServeArgs;
