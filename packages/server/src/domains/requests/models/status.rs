use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::Stage;

/// Lifecycle status of a pass request.
///
/// DECLINED_USB and DECLINED_AS are terminal for the request. ISSUED and
/// CLOSED are reached after approval, at the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    PendingUsb,
    ApprovedUsb,
    DeclinedUsb,
    PendingAs,
    ApprovedAs,
    DeclinedAs,
    Issued,
    Closed,
}

impl RequestStatus {
    /// Statuses in which a stage authority may act on the request.
    ///
    /// USB acts on its own stage set. AS acts once the request has passed or
    /// skipped USB, and never on a request USB declined outright.
    pub fn allows_stage(self, stage: Stage) -> bool {
        match stage {
            Stage::Usb => matches!(
                self,
                RequestStatus::PendingUsb | RequestStatus::ApprovedUsb | RequestStatus::DeclinedUsb
            ),
            Stage::As => matches!(
                self,
                RequestStatus::ApprovedUsb
                    | RequestStatus::PendingAs
                    | RequestStatus::ApprovedAs
                    | RequestStatus::DeclinedAs
            ),
        }
    }

    /// Whether the pass can be presented at a checkpoint.
    pub fn is_admissible(self) -> bool {
        matches!(self, RequestStatus::ApprovedAs | RequestStatus::Issued)
    }

    /// Whether the request is still awaiting its first decision.
    pub fn is_pending(self) -> bool {
        matches!(self, RequestStatus::PendingUsb | RequestStatus::PendingAs)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::PendingUsb => "PENDING_USB",
            RequestStatus::ApprovedUsb => "APPROVED_USB",
            RequestStatus::DeclinedUsb => "DECLINED_USB",
            RequestStatus::PendingAs => "PENDING_AS",
            RequestStatus::ApprovedAs => "APPROVED_AS",
            RequestStatus::DeclinedAs => "DECLINED_AS",
            RequestStatus::Issued => "ISSUED",
            RequestStatus::Closed => "CLOSED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_USB" => Ok(RequestStatus::PendingUsb),
            "APPROVED_USB" => Ok(RequestStatus::ApprovedUsb),
            "DECLINED_USB" => Ok(RequestStatus::DeclinedUsb),
            "PENDING_AS" => Ok(RequestStatus::PendingAs),
            "APPROVED_AS" => Ok(RequestStatus::ApprovedAs),
            "DECLINED_AS" => Ok(RequestStatus::DeclinedAs),
            "ISSUED" => Ok(RequestStatus::Issued),
            "CLOSED" => Ok(RequestStatus::Closed),
            _ => Err(anyhow::anyhow!("Invalid request status: {}", s)),
        }
    }
}

/// Lifecycle status of a single visitor entry.
///
/// Mirrors the approval stages of the owning request; a decline is terminal
/// per-person at the USB stage (AS may still overwrite it in a bulk AS
/// decline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "person_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonStatus {
    PendingUsb,
    ApprovedUsb,
    DeclinedUsb,
    PendingAs,
    ApprovedAs,
    DeclinedAs,
}

impl PersonStatus {
    /// USB has decided this person.
    pub fn usb_decided(self) -> bool {
        matches!(self, PersonStatus::ApprovedUsb | PersonStatus::DeclinedUsb)
    }

    /// AS has decided this person.
    pub fn as_decided(self) -> bool {
        matches!(self, PersonStatus::ApprovedAs | PersonStatus::DeclinedAs)
    }

    /// The person was approved by USB at some point (possibly further
    /// processed by AS since).
    pub fn usb_ever_approved(self) -> bool {
        matches!(
            self,
            PersonStatus::ApprovedUsb | PersonStatus::ApprovedAs | PersonStatus::DeclinedAs
        )
    }

    /// Declined at either stage.
    pub fn is_declined(self) -> bool {
        matches!(self, PersonStatus::DeclinedUsb | PersonStatus::DeclinedAs)
    }
}

impl fmt::Display for PersonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PersonStatus::PendingUsb => "PENDING_USB",
            PersonStatus::ApprovedUsb => "APPROVED_USB",
            PersonStatus::DeclinedUsb => "DECLINED_USB",
            PersonStatus::PendingAs => "PENDING_AS",
            PersonStatus::ApprovedAs => "APPROVED_AS",
            PersonStatus::DeclinedAs => "DECLINED_AS",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PersonStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_USB" => Ok(PersonStatus::PendingUsb),
            "APPROVED_USB" => Ok(PersonStatus::ApprovedUsb),
            "DECLINED_USB" => Ok(PersonStatus::DeclinedUsb),
            "PENDING_AS" => Ok(PersonStatus::PendingAs),
            "APPROVED_AS" => Ok(PersonStatus::ApprovedAs),
            "DECLINED_AS" => Ok(PersonStatus::DeclinedAs),
            _ => Err(anyhow::anyhow!("Invalid person status: {}", s)),
        }
    }
}
