// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod event_bus;
pub mod fix_templates;
pub mod legal_text_client;
pub mod llm;
pub mod prompt_template_engine;
pub mod repositories;

pub use event_bus::EventBus;
pub use fix_templates::TemplateCatalog;
pub use legal_text_client::HttpLegalTextProvider;
