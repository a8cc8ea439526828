// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reply client for the LINE Messaging API.

use crate::commands::chat::{Reply, QUICK_REPLIES};
use crate::utils::http_client;
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

pub const REPLY_ENDPOINT: &str = "https://api.line.me/v2/bot/message/reply";

pub struct LineClient {
    http: reqwest::blocking::Client,
    token: String,
}

impl LineClient {
    pub fn new(token: &str) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            token: token.to_string(),
        })
    }

    pub fn reply(&self, reply_token: &str, reply: &Reply, dashboard_url: &str) -> Result<()> {
        let body = reply_payload(reply_token, reply, dashboard_url);
        let resp = self
            .http
            .post(REPLY_ENDPOINT)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .with_context(|| format!("POST {}", REPLY_ENDPOINT))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(anyhow!("LINE reply failed ({}): {}", status, detail));
        }
        tracing::debug!(%status, "LINE reply delivered");
        Ok(())
    }
}

/// Reply request body with the persistent quick-reply buttons.
pub fn reply_payload(reply_token: &str, reply: &Reply, dashboard_url: &str) -> Value {
    let mut items: Vec<Value> = QUICK_REPLIES
        .iter()
        .map(|label| {
            json!({
                "type": "action",
                "action": { "type": "message", "label": label, "text": label }
            })
        })
        .collect();
    // the dashboard link sits before the help button
    items.insert(
        items.len() - 1,
        json!({
            "type": "action",
            "action": { "type": "uri", "label": "查看網頁版", "uri": dashboard_url }
        }),
    );
    json!({
        "replyToken": reply_token,
        "messages": [{
            "type": "text",
            "text": reply.text,
            "quickReply": { "items": items }
        }]
    })
}
