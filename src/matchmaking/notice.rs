//! User-facing rendering of join failures

use crate::types::{JoinFailure, RejectionReason};
use serde::Serialize;

/// Modal shown on top of the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModalKind {
    /// Closed by acknowledging
    Acknowledge,
    /// Closed only after ticking an explicit agreement checkbox
    ConsentRequired,
}

/// Message for a failed join; without a modal it is a plain retry banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinNotice {
    pub title: Option<&'static str>,
    pub message: &'static str,
    pub modal: Option<ModalKind>,
}

impl JoinNotice {
    pub fn requires_acknowledgment(&self) -> bool {
        self.modal.is_some()
    }
}

pub fn notice_for_rejection(reason: RejectionReason) -> JoinNotice {
    match reason {
        RejectionReason::RateLimit => JoinNotice {
            title: None,
            message: "Error joining game.\nPlease try again in a few minutes.",
            modal: None,
        },
        RejectionReason::Warning => JoinNotice {
            title: Some("Teaming is against the rules!"),
            message: "You have been reported for teaming. Allying with other players for extended periods is not allowed. If you continue to team, you will be banned.",
            modal: Some(ModalKind::ConsentRequired),
        },
        RejectionReason::TempBan => JoinNotice {
            title: Some("You have been banned for 1 day for teaming!"),
            message: "Remember, allying with other players for extended periods is not allowed!\n\nWhen your ban is up, reload the page to clear this message.",
            modal: Some(ModalKind::Acknowledge),
        },
        RejectionReason::PermaBan => JoinNotice {
            title: Some("You have been permanently banned for hacking!"),
            message: "The use of scripts, plugins, extensions, etc. to modify the game in order to gain an advantage over opponents is strictly forbidden.",
            modal: Some(ModalKind::Acknowledge),
        },
        RejectionReason::Unspecified => JoinNotice {
            title: None,
            message: "Error joining game.\nPlease try again in 30 seconds.",
            modal: None,
        },
    }
}

pub fn notice_for(failure: &JoinFailure) -> JoinNotice {
    match failure {
        JoinFailure::Rejected(reason) => notice_for_rejection(*reason),
        JoinFailure::Transport(_) => JoinNotice {
            title: None,
            message: "Error finding game.\nPlease try again.",
            modal: None,
        },
    }
}
