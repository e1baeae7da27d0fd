// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracking-code generation.

use chrono::{DateTime, FixedOffset};
use rand::Rng;

/// `<prefix><yymmddHHMMSS in office time><4 hex digits>`, e.g. `PACK2601101630057F3A`.
pub fn generate_tracking_code(prefix: &str, now: DateTime<FixedOffset>) -> String {
    let suffix: u16 = rand::thread_rng().r#gen();
    format!("{prefix}{}{suffix:04X}", now.format("%y%m%d%H%M%S"))
}

/// Caller-supplied codes are trimmed and upper-cased; blank ones count as absent.
pub fn clean_tracking_code(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_code_carries_local_timestamp() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2026, 1, 10, 16, 30, 5).unwrap();
        let code = generate_tracking_code("PACK", now);

        assert_eq!(code.len(), "PACK".len() + 12 + 4);
        assert!(code.starts_with("PACK260110163005"));
        assert!(code[16..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn caller_codes_are_cleaned() {
        assert_eq!(clean_tracking_code(Some("  pack-42 ")).as_deref(), Some("PACK-42"));
        assert_eq!(clean_tracking_code(Some("   ")), None);
        assert_eq!(clean_tracking_code(None), None);
    }
}
