//! Air-gap guard: the UI may only fetch from the deployment's own origin.

use serde::Serialize;
use std::collections::BTreeSet;
use url::Url;

use crate::browser::{DriverResult, PageBackend};

/// Loopback origins a local deployment may also be reached through
const LOOPBACK_ORIGINS: [&str; 6] = [
    "http://localhost:8080",
    "http://127.0.0.1:8080",
    "http://localhost",
    "http://127.0.0.1",
    "https://localhost",
    "https://127.0.0.1",
];

/// Blocked requests kept in the report detail
const MAX_LISTED: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirgapCheck {
    pub pass: bool,
    pub errors: Vec<String>,
    pub blocked_requests: Vec<String>,
    pub blocked_count: usize,
}

/// Serialized origin of a URL, `None` when it does not parse
fn origin_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.origin().ascii_serialization())
}

/// The target's origin plus the loopback aliases
pub fn allowed_origins(base_url: &str) -> BTreeSet<String> {
    origin_of(base_url)
        .into_iter()
        .chain(LOOPBACK_ORIGINS.iter().map(|o| o.to_string()))
        .collect()
}

/// Whether a fetched URL leaves the allowed origins
pub fn is_external(url: &str, allowed: &BTreeSet<String>) -> bool {
    if url.starts_with("data:") || url.starts_with("blob:") || url == "about:blank" {
        return false;
    }
    match origin_of(url) {
        Some(origin) => !allowed.contains(&origin),
        None => true,
    }
}

/// Compare already-collected URLs against the allowed origins
pub fn evaluate_airgap(urls: &[String], allowed: &BTreeSet<String>) -> AirgapCheck {
    let blocked: Vec<String> = urls
        .iter()
        .filter(|u| is_external(u, allowed))
        .cloned()
        .collect();
    let errors = if blocked.is_empty() {
        Vec::new()
    } else {
        vec![format!("{} external request(s), first: {}", blocked.len(), blocked[0])]
    };
    AirgapCheck {
        pass: errors.is_empty(),
        errors,
        blocked_count: blocked.len(),
        blocked_requests: blocked.into_iter().take(MAX_LISTED).collect(),
    }
}

/// Read the page's resource list and check every origin
pub fn check_airgap<B: PageBackend + ?Sized>(page: &mut B, base_url: &str) -> DriverResult<AirgapCheck> {
    let urls = page.resource_urls()?;
    Ok(evaluate_airgap(&urls, &allowed_origins(base_url)))
}
