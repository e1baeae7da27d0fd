// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification text for parcel events. Pure and deterministic.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use depot_core::{Package, PackageType};
use strum::Display;

/// Events that produce an owner notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationEvent {
    Received,
    Completed,
    Expired,
}

/// Names of the people a message mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parties {
    pub owner_name: String,
    /// Shown on receipt.
    pub sender_name: Option<String>,
    /// Who collected the parcel, shown on completion. Falls back to the owner.
    pub recipient_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Composer {
    office_name: String,
    offset: FixedOffset,
}

impl Composer {
    pub fn new(office_name: impl Into<String>, utc_offset_hours: i32) -> Self {
        Self {
            office_name: office_name.into(),
            offset: office_offset(utc_offset_hours),
        }
    }

    pub fn compose(&self, event: NotificationEvent, pkg: &Package, parties: &Parties) -> String {
        let details = format!(
            "Description: {}\nType: {}, quantity: {}",
            pkg.description,
            type_label(pkg.package_type),
            pkg.quantity
        );
        match event {
            NotificationEvent::Received => format!(
                "Hello {owner}, package *{code}* was received at {office} on *{date}*.\n\n\
                 {details}\nFrom: {sender}\n\n\
                 You can collect it at any time.",
                owner = parties.owner_name,
                code = pkg.tracking_code,
                office = self.office_name,
                date = self.date(pkg.created_at),
                sender = parties.sender_name.as_deref().unwrap_or("unknown sender"),
            ),
            NotificationEvent::Completed => format!(
                "Package *{code}* was collected by {collector} on *{date}*.\n\n\
                 {details}\n\n\
                 Thank you for using {office}!",
                code = pkg.tracking_code,
                collector = parties
                    .recipient_name
                    .as_deref()
                    .unwrap_or(&parties.owner_name),
                date = self.date(pkg.completed_at.unwrap_or(pkg.updated_at)),
                office = self.office_name,
            ),
            NotificationEvent::Expired => format!(
                "Package *{code}* was not collected before *{date}* and is now *expired*.\n\n\
                 {details}\n\n\
                 Please contact {office} for more information.",
                code = pkg.tracking_code,
                date = self.date(pkg.expired_at),
                office = self.office_name,
            ),
        }
    }

    /// `10 Jan 2026` in office time.
    pub fn date(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%d %b %Y").to_string()
    }
}

/// Hours east of UTC as a chrono offset. Out-of-range values fall back to UTC.
pub fn office_offset(utc_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

fn type_label(kind: PackageType) -> &'static str {
    match kind {
        PackageType::Document => "document",
        PackageType::Item => "item",
        PackageType::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use depot_core::PackageStatus;

    fn pkg() -> Package {
        // 17:30 UTC is already the next day at UTC+7.
        let created = Utc.with_ymd_and_hms(2026, 1, 9, 17, 30, 0).unwrap();
        Package {
            id: "p-1".into(),
            tracking_code: "PACK260110003000BEEF".into(),
            description: "Blue shoe box".into(),
            package_type: PackageType::Item,
            quantity: 2,
            photo: None,
            status: PackageStatus::Received,
            owner_id: "o".into(),
            sender_id: "s".into(),
            locker_id: "l".into(),
            picked_up_by: None,
            proof_image: None,
            completed_at: None,
            expired_at: created + chrono::Duration::days(90),
            deleted_at: None,
            created_at: created,
            updated_at: created,
            version: 0,
        }
    }

    fn parties() -> Parties {
        Parties {
            owner_name: "Sari".into(),
            sender_name: Some("Courier Co".into()),
            recipient_name: None,
        }
    }

    #[test]
    fn received_message() {
        let text = Composer::new("the Depot mailroom", 7).compose(
            NotificationEvent::Received,
            &pkg(),
            &parties(),
        );
        assert_eq!(
            text,
            "Hello Sari, package *PACK260110003000BEEF* was received at the Depot mailroom on *10 Jan 2026*.\n\n\
             Description: Blue shoe box\nType: item, quantity: 2\nFrom: Courier Co\n\n\
             You can collect it at any time."
        );
    }

    #[test]
    fn completed_message_names_collector() {
        let mut p = pkg();
        p.completed_at = Some(Utc.with_ymd_and_hms(2026, 1, 12, 3, 0, 0).unwrap());
        let mut who = parties();
        who.recipient_name = Some("Front desk".into());

        let text = Composer::new("Depot", 7).compose(NotificationEvent::Completed, &p, &who);
        assert_eq!(
            text,
            "Package *PACK260110003000BEEF* was collected by Front desk on *12 Jan 2026*.\n\n\
             Description: Blue shoe box\nType: item, quantity: 2\n\n\
             Thank you for using Depot!"
        );
    }

    #[test]
    fn completed_message_falls_back_to_owner() {
        let mut p = pkg();
        p.completed_at = Some(p.created_at);
        let text = Composer::new("Depot", 0).compose(NotificationEvent::Completed, &p, &parties());
        assert!(text.contains("collected by Sari on *09 Jan 2026*"));
    }

    #[test]
    fn expired_message() {
        let text = Composer::new("Depot", 7).compose(NotificationEvent::Expired, &pkg(), &parties());
        assert_eq!(
            text,
            "Package *PACK260110003000BEEF* was not collected before *10 Apr 2026* and is now *expired*.\n\n\
             Description: Blue shoe box\nType: item, quantity: 2\n\n\
             Please contact Depot for more information."
        );
    }
}
