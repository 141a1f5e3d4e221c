// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the tracker, the persistence layer and Discord.
//!
//! Both traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod guild;
pub mod storage;

pub use guild::GuildGateway;
pub use storage::InvitationStore;
