// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owners, senders, lockers, and recipients.
//!
//! The engine only reads these; the insert functions exist for seeding and
//! for the administration commands. Owner phone numbers are stored in
//! normalised form, the same form notifications are sent to.

use depot_core::{DepotError, Locker, Owner, Recipient, Sender, normalize_phone};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Rejects an owner whose phone number cannot be normalised.
pub async fn insert_owner(db: &Database, owner: &Owner) -> Result<(), DepotError> {
    let phone_number = normalize_phone(&owner.phone_number).ok_or_else(|| {
        DepotError::Validation(format!(
            "owner {} has an unusable phone number `{}`",
            owner.id, owner.phone_number
        ))
    })?;
    let o = Owner {
        phone_number,
        ..owner.clone()
    };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO owners (id, name, phone_number) VALUES (?1, ?2, ?3)",
                params![o.id, o.name, o.phone_number],
            )
            .map(|_| ())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_sender(db: &Database, sender: &Sender) -> Result<(), DepotError> {
    let s = sender.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO senders (id, name, phone_number) VALUES (?1, ?2, ?3)",
                params![s.id, s.name, s.phone_number],
            )
            .map(|_| ())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_locker(db: &Database, locker: &Locker) -> Result<(), DepotError> {
    let l = locker.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO lockers (id, code) VALUES (?1, ?2)",
                params![l.id, l.code],
            )
            .map(|_| ())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_recipient(db: &Database, recipient: &Recipient) -> Result<(), DepotError> {
    let r = recipient.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO recipients (id, name, phone_number) VALUES (?1, ?2, ?3)",
                params![r.id, r.name, r.phone_number],
            )
            .map(|_| ())
        })
        .await
        .map_err(map_tr_err)
}

fn owner_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        name: row.get(1)?,
        phone_number: row.get(2)?,
    })
}

pub async fn get_owner(db: &Database, id: &str) -> Result<Option<Owner>, DepotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, phone_number FROM owners WHERE id = ?1",
                params![id],
                owner_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The earliest-registered owner wins when a number is shared.
pub async fn find_owner_by_phone(db: &Database, phone: &str) -> Result<Option<Owner>, DepotError> {
    let Some(phone) = normalize_phone(phone) else {
        return Ok(None);
    };
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, phone_number FROM owners WHERE phone_number = ?1
                 ORDER BY created_at ASC, rowid ASC LIMIT 1",
                params![phone],
                owner_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_sender(db: &Database, id: &str) -> Result<Option<Sender>, DepotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, phone_number FROM senders WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Sender {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        phone_number: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_locker(db: &Database, id: &str) -> Result<Option<Locker>, DepotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, code FROM lockers WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Locker {
                        id: row.get(0)?,
                        code: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_recipient(db: &Database, id: &str) -> Result<Option<Recipient>, DepotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, phone_number FROM recipients WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Recipient {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        phone_number: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
