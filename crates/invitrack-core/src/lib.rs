// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Invitrack invite tracker.
//!
//! This crate provides the error taxonomy, the invitation domain types and
//! the two trait seams ([`InvitationStore`] and [`GuildGateway`]) that let
//! the tracker run against SQLite and Discord in production and against
//! temp databases and mocks in tests.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::InvitrackError;
pub use traits::{GuildGateway, InvitationStore};
pub use types::{
    GuildInvite, GuildRole, HealthStatus, Invitation, InvitationPatch, LeaderboardEntry,
    MemberRolesChanged, UNKNOWN_INVITER,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invitation_defaults_to_unknown_inviter() {
        let invitation = Invitation::new("abc123", None);
        assert_eq!(invitation.inviter, UNKNOWN_INVITER);
        assert_eq!(invitation.uses, 0);
        assert_eq!(invitation.count, 0);
    }

    #[test]
    fn invitation_builders_set_counters() {
        let invitation = Invitation::new("abc123", Some("42")).with_uses(3).with_count(1);
        assert_eq!(invitation.inviter, "42");
        assert_eq!(invitation.uses, 3);
        assert_eq!(invitation.count, 1);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(InvitationPatch::default().is_empty());
        assert!(!InvitationPatch::count(1).is_empty());
        assert!(!InvitationPatch::uses(1).is_empty());
    }

    #[test]
    fn invitation_serializes_with_field_names() {
        let invitation = Invitation::new("xyz", Some("7")).with_count(2);
        let json = serde_json::to_value(&invitation).expect("should serialize");
        assert_eq!(json["code"], "xyz");
        assert_eq!(json["inviter"], "7");
        assert_eq!(json["count"], 2);
    }

    #[test]
    fn constraint_detection_looks_through_transactions() {
        let direct = InvitrackError::Constraint {
            source: Box::new(std::io::Error::other("UNIQUE constraint failed")),
        };
        assert!(direct.is_constraint());

        let wrapped = InvitrackError::Transaction {
            message: "statement 0 failed".into(),
            source: Some(Box::new(direct)),
        };
        assert!(wrapped.is_constraint());

        let other = InvitrackError::Query {
            source: Box::new(std::io::Error::other("syntax error")),
        };
        assert!(!other.is_constraint());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_store<T: InvitationStore>() {}
        fn _assert_gateway<T: GuildGateway>() {}
    }
}
