//! resolve.rs — turn a free-form channel reference (URL, @handle, plain
//! name) into a canonical `ChannelId`.
//!
//! Precedence, first match wins:
//! 1. literal "UC…" id anywhere in the input (zero-cost, no network),
//! 2. `@handle` token → one search scoped to the handle,
//! 3. raw-text search (can match an unrelated channel with the same display
//!    name; accepted ambiguity of a last-resort lookup).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AnalyzeError, Result};
use crate::provider::{ChannelId, MetricsProvider};

static RE_CHANNEL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(UC[0-9A-Za-z_-]{22})").unwrap());
static RE_HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z0-9_\-.]+)").unwrap());

pub async fn resolve(provider: &dyn MetricsProvider, text: &str) -> Result<ChannelId> {
    let text = text.trim();

    if let Some(caps) = RE_CHANNEL_ID.captures(text) {
        return Ok(ChannelId(caps[1].to_string()));
    }

    if let Some(caps) = RE_HANDLE.captures(text) {
        let handle = format!("@{}", &caps[1]);
        if let Some(id) = provider.search_channel(&handle).await? {
            return Ok(id);
        }
    }

    if let Some(id) = provider.search_channel(text).await? {
        return Ok(id);
    }

    Err(AnalyzeError::not_found(text))
}
