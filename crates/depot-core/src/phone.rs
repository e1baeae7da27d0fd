// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone numbers as stored, looked up, and dialled.

/// Country code substituted for a leading trunk `0`.
pub const DEFAULT_COUNTRY_CODE: &str = "62";

/// Normalise a phone number into the digits-only international form used as
/// a channel destination and as the owner lookup key.
///
/// Separators and a leading `+` are dropped; a leading `0` becomes the
/// default country code. Returns `None` when the result is not 8 to 15 digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits = String::with_capacity(raw.len());
    for (i, c) in raw.trim().chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            '+' if i == 0 => {}
            _ => return None,
        }
    }
    if let Some(rest) = digits.strip_prefix('0') {
        digits = format!("{DEFAULT_COUNTRY_CODE}{rest}");
    }
    (8..=15).contains(&digits.len()).then_some(digits)
}
