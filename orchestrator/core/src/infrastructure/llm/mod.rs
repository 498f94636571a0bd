// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each provider adapter translates between our domain interface and an external API.
// The registry resolves aliases and applies the call policy.

pub mod anthropic;
pub mod openai;
pub mod registry;

pub use registry::{ProviderRegistry, RetryPolicy};
