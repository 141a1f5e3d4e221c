// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Invitrack integration tests.
//!
//! Provides a mock guild gateway and temp-directory stores for fast,
//! deterministic, CI-runnable tests without a Discord connection.
//!
//! # Components
//!
//! - [`MockGuild`] - In-memory `GuildGateway` that records role grants and revokes
//! - [`TempStore`] - Initialized SQLite invitation store in a temp directory

pub mod harness;
pub mod mock_guild;

pub use harness::{TempStore, test_bot_config};
pub use mock_guild::{MockGuild, RoleChange};
