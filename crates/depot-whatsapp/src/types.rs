// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud API request and response bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct TextMessageRequest<'a> {
    pub messaging_product: &'static str,
    pub to: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextBody<'a> {
    pub body: &'a str,
    pub preview_url: bool,
}

impl<'a> TextMessageRequest<'a> {
    pub fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody {
                body,
                preview_url: false,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}
