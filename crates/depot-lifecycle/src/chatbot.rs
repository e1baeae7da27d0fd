// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answers parcel questions from registered owners.
//!
//! Intent extraction is pluggable through [`IntentExtractor`]; the built-in
//! [`KeywordIntentExtractor`] covers the supported phrasings without a
//! language model. Replies are built from [`PackageLookup`] only.

use std::sync::Arc;

use async_trait::async_trait;
use depot_core::{ChatIntent, DepotError, DirectoryStore, IntentExtractor, Owner, Package};
use tracing::{debug, warn};

use crate::compose::Composer;
use crate::lookup::PackageLookup;
use depot_core::normalize_phone;

const HELP_HINT: &str = "Type *check package <tracking_code>* for details.";
const TROUBLE_REPLY: &str = "Sorry, the system is having trouble right now. Please try again later.";

pub struct ChatbotResponder {
    lookup: Arc<PackageLookup>,
    directory: Arc<dyn DirectoryStore>,
    extractor: Arc<dyn IntentExtractor>,
    composer: Composer,
}

impl ChatbotResponder {
    pub fn new(
        lookup: Arc<PackageLookup>,
        directory: Arc<dyn DirectoryStore>,
        extractor: Arc<dyn IntentExtractor>,
        composer: Composer,
    ) -> Self {
        Self {
            lookup,
            directory,
            extractor,
            composer,
        }
    }

    /// Reply to `text` from `sender_phone`.
    ///
    /// `Ok(None)` means the sender is not a registered owner and gets no
    /// reply. Lookup and extraction failures become an apologetic reply.
    pub async fn respond(&self, sender_phone: &str, text: &str) -> Result<Option<String>, DepotError> {
        let Some(phone) = normalize_phone(sender_phone) else {
            debug!(sender_phone, "ignoring message from unusable number");
            return Ok(None);
        };
        let Some(owner) = self.directory.find_owner_by_phone(&phone).await? else {
            debug!(phone = %phone, "ignoring message from unregistered sender");
            return Ok(None);
        };

        let intent = match self.extractor.extract(text).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(phone = %phone, error = %e, "intent extraction failed");
                return Ok(Some(TROUBLE_REPLY.to_string()));
            }
        };
        debug!(phone = %phone, ?intent, "chat intent");

        let reply = match self.answer(&owner, &phone, intent).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(phone = %phone, error = %e, "chat lookup failed");
                TROUBLE_REPLY.to_string()
            }
        };
        Ok(Some(reply))
    }

    async fn answer(&self, owner: &Owner, phone: &str, intent: ChatIntent) -> Result<String, DepotError> {
        let reply = match intent {
            ChatIntent::TotalAllPackage => {
                let total = self.lookup.count_by_owner_phone(phone).await?;
                format!("You have a total of *{total}* packages on record.")
            }
            ChatIntent::ListPackageToday => {
                let packages = self.lookup.list_today_by_owner_phone(phone).await?;
                if packages.is_empty() {
                    "No packages arrived for you today.".to_string()
                } else {
                    format!(
                        "Here are your packages from today:\n{}\n{HELP_HINT}",
                        numbered(&packages)
                    )
                }
            }
            ChatIntent::ListPackageAll => {
                let packages = self.lookup.list_by_owner_phone(phone).await?;
                if packages.is_empty() {
                    "No packages were found for this number.".to_string()
                } else {
                    format!("All your packages:\n{}\n{HELP_HINT}", numbered(&packages))
                }
            }
            ChatIntent::CheckPackage { tracking_code: None } => {
                "Please include a package code, for example: check package PACK123456".to_string()
            }
            ChatIntent::CheckPackage {
                tracking_code: Some(code),
            } => match self.lookup.find_by_tracking_code(&code).await? {
                Some(pkg) if pkg.owner_id == owner.id => format!(
                    "Package *{}* is *{}*.\nDescription: {}\nReceived: {}",
                    pkg.tracking_code,
                    pkg.status,
                    pkg.description,
                    self.composer.date(pkg.created_at)
                ),
                _ => "Package not found.".to_string(),
            },
            ChatIntent::Greeting => format!(
                "Hi {}! I can help you check your packages. Try *check package <tracking_code>* or *packages today*.",
                owner.name
            ),
            ChatIntent::Thanks => {
                "You're welcome! Message me any time you want to check a package.".to_string()
            }
            ChatIntent::Unknown => {
                "Sorry, I didn't understand that. Try *check package PACKxxxxx* or *my packages today*."
                    .to_string()
            }
        };
        Ok(reply)
    }
}

fn numbered(packages: &[Package]) -> String {
    packages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {} - {}\n", i + 1, p.tracking_code, p.description))
        .collect()
}

/// Rule-based intent extraction over lower-cased keywords.
pub struct KeywordIntentExtractor {
    tracking_prefix: String,
}

impl KeywordIntentExtractor {
    pub fn new(tracking_prefix: &str) -> Self {
        Self {
            tracking_prefix: tracking_prefix.to_ascii_uppercase(),
        }
    }

    pub fn classify(&self, text: &str) -> ChatIntent {
        let lower = text.trim().to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| !w.is_empty())
            .collect();
        let has = |w: &str| words.contains(&w);

        let code = text
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .map(str::to_ascii_uppercase)
            .find(|w| {
                w.strip_prefix(self.tracking_prefix.as_str())
                    .is_some_and(|rest| rest.chars().any(|c| c.is_ascii_digit()))
            });

        if code.is_some() || has("check") || has("status") || has("track") {
            return ChatIntent::CheckPackage {
                tracking_code: code,
            };
        }
        if has("today") {
            return ChatIntent::ListPackageToday;
        }
        if has("total") || has("count") || lower.contains("how many") {
            return ChatIntent::TotalAllPackage;
        }
        if has("list") || has("all") || has("packages") || has("parcels") {
            return ChatIntent::ListPackageAll;
        }
        if has("thanks") || has("thank") || has("thx") {
            return ChatIntent::Thanks;
        }
        if ["hi", "hello", "hey", "morning", "evening", "afternoon"]
            .iter()
            .any(|g| has(g))
        {
            return ChatIntent::Greeting;
        }
        ChatIntent::Unknown
    }
}

#[async_trait]
impl IntentExtractor for KeywordIntentExtractor {
    async fn extract(&self, text: &str) -> Result<ChatIntent, DepotError> {
        Ok(self.classify(text))
    }
}
