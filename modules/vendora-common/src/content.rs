//! Content security filter — the first gate a candidate notification passes.
//!
//! Rejects, never mutates: silent truncation could hide material information
//! and silent stripping would make audit entries and test assertions
//! ambiguous. The caller gets a reason and fixes the upstream data.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::NotifyError;
use crate::types::NotificationRequest;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_MESSAGE_CHARS: usize = 1000;

static SCRIPT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*script\b").unwrap());
static EMBED_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*(iframe|object|embed)\b").unwrap());
static EVENT_HANDLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon[a-z]+\s*=").unwrap());
static URL_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(javascript|vbscript|data)\s*:").unwrap());
static PROFANITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(fuck|shit|bitch|asshole|bastard|cunt)\b").unwrap()
});

/// Returns what makes `text` unsafe to render, if anything.
fn unsafe_markup(text: &str) -> Option<&'static str> {
    if SCRIPT_TAG_RE.is_match(text) {
        return Some("script tag");
    }
    if EMBED_TAG_RE.is_match(text) {
        return Some("embedded frame/object tag");
    }
    if EVENT_HANDLER_RE.is_match(text) {
        return Some("inline event handler");
    }
    if URL_SCHEME_RE.is_match(text) {
        return Some("disallowed URL scheme");
    }
    if PROFANITY_RE.is_match(text) {
        return Some("profanity");
    }
    None
}

/// Walk every string in a metadata value. Notification metadata is rendered
/// in clients the same way title/message are, so it gets the same checks.
fn scan_metadata(value: &serde_json::Value) -> Option<&'static str> {
    match value {
        serde_json::Value::String(s) => unsafe_markup(s),
        serde_json::Value::Array(items) => items.iter().find_map(scan_metadata),
        serde_json::Value::Object(map) => map.values().find_map(scan_metadata),
        _ => None,
    }
}

pub struct ContentFilter {
    /// Origins (scheme + host + port) an absolute action URL may point at.
    allowed_origins: Vec<String>,
}

impl ContentFilter {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins: allowed_origins
                .into_iter()
                .map(|o| o.trim_end_matches('/').to_lowercase())
                .collect(),
        }
    }

    /// Validate a candidate request. Returns the request untouched on
    /// success — a surviving request is byte-identical to its input.
    pub fn filter(&self, request: NotificationRequest) -> Result<NotificationRequest, NotifyError> {
        if request.title.trim().is_empty() {
            return Err(reject("title is empty"));
        }
        if request.message.trim().is_empty() {
            return Err(reject("message is empty"));
        }
        if request.title.chars().count() > MAX_TITLE_CHARS {
            return Err(reject_owned(format!(
                "title exceeds {MAX_TITLE_CHARS} characters"
            )));
        }
        if request.message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(reject_owned(format!(
                "message exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }

        if let Some(what) = unsafe_markup(&request.title) {
            return Err(reject_owned(format!("title contains {what}")));
        }
        if let Some(what) = unsafe_markup(&request.message) {
            return Err(reject_owned(format!("message contains {what}")));
        }
        for (key, value) in &request.metadata {
            if let Some(what) = scan_metadata(value) {
                return Err(reject_owned(format!("metadata field '{key}' contains {what}")));
            }
        }

        if let Some(url) = &request.action_url {
            self.check_action_url(url)?;
        }

        Ok(request)
    }

    fn check_action_url(&self, raw: &str) -> Result<(), NotifyError> {
        // Relative links stay inside the platform and are always allowed.
        if raw.starts_with('/') && !raw.starts_with("//") {
            return Ok(());
        }

        let parsed = url::Url::parse(raw)
            .map_err(|_| reject_owned(format!("action URL is not valid: {raw}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(reject_owned(format!(
                "action URL scheme '{}' is not allowed",
                parsed.scheme()
            )));
        }

        let origin = match parsed.port() {
            Some(port) => format!(
                "{}://{}:{}",
                parsed.scheme(),
                parsed.host_str().unwrap_or_default(),
                port
            ),
            None => format!(
                "{}://{}",
                parsed.scheme(),
                parsed.host_str().unwrap_or_default()
            ),
        }
        .to_lowercase();

        if self.allowed_origins.iter().any(|o| *o == origin) {
            return Ok(());
        }

        Err(reject_owned(format!(
            "action URL origin '{origin}' is not allow-listed"
        )))
    }
}

fn reject(reason: &str) -> NotifyError {
    NotifyError::ValidationRejected {
        reason: reason.to_string(),
    }
}

fn reject_owned(reason: String) -> NotifyError {
    NotifyError::ValidationRejected { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Identity, NotificationType};
    use uuid::Uuid;

    fn filter() -> ContentFilter {
        ContentFilter::new(vec!["https://app.vendora.example".to_string()])
    }

    fn request(title: &str, message: &str) -> NotificationRequest {
        NotificationRequest::builder()
            .recipient(Identity::user(Uuid::new_v4()))
            .notification_type(NotificationType::General)
            .title(title)
            .message(message)
            .build()
    }

    fn request_with_url(url: &str) -> NotificationRequest {
        NotificationRequest::builder()
            .recipient(Identity::user(Uuid::new_v4()))
            .notification_type(NotificationType::General)
            .title("Order shipped")
            .message("Your order is on the way")
            .action_url(url)
            .build()
    }

    #[test]
    fn clean_request_passes_unmodified() {
        let req = request("Low stock: Blue Mug", "Only 3 units remain");
        let title = req.title.clone();
        let message = req.message.clone();
        let out = filter().filter(req).unwrap();
        assert_eq!(out.title, title);
        assert_eq!(out.message, message);
    }

    #[test]
    fn rejects_script_tag() {
        let err = filter()
            .filter(request("hi <script>alert(1)</script>", "m"))
            .unwrap_err();
        assert!(matches!(err, NotifyError::ValidationRejected { .. }));
    }

    #[test]
    fn rejects_inline_event_handler() {
        assert!(filter()
            .filter(request("t", "<img src=x onerror=alert(1)>"))
            .is_err());
    }

    #[test]
    fn rejects_iframe() {
        assert!(filter()
            .filter(request("t", "<iframe src='https://evil.example'>"))
            .is_err());
    }

    #[test]
    fn rejects_javascript_scheme_in_message() {
        assert!(filter()
            .filter(request("t", "click javascript:alert(1)"))
            .is_err());
    }

    #[test]
    fn rejects_oversized_title() {
        let long = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(filter().filter(request(&long, "m")).is_err());
    }

    #[test]
    fn accepts_title_at_limit() {
        let exact = "x".repeat(MAX_TITLE_CHARS);
        assert!(filter().filter(request(&exact, "m")).is_ok());
    }

    #[test]
    fn rejects_oversized_message() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(filter().filter(request("t", &long)).is_err());
    }

    #[test]
    fn rejects_empty_title() {
        assert!(filter().filter(request("   ", "m")).is_err());
    }

    #[test]
    fn rejects_profanity() {
        assert!(filter().filter(request("t", "this is shit")).is_err());
    }

    #[test]
    fn relative_action_url_allowed() {
        assert!(filter()
            .filter(request_with_url("/orders/12345"))
            .is_ok());
    }

    #[test]
    fn protocol_relative_url_rejected() {
        assert!(filter().filter(request_with_url("//evil.example/x")).is_err());
    }

    #[test]
    fn allow_listed_origin_accepted() {
        assert!(filter()
            .filter(request_with_url("https://app.vendora.example/orders/1"))
            .is_ok());
    }

    #[test]
    fn unknown_origin_rejected() {
        assert!(filter()
            .filter(request_with_url("https://phish.example/orders/1"))
            .is_err());
    }

    #[test]
    fn javascript_action_url_rejected() {
        assert!(filter()
            .filter(request_with_url("javascript:alert(1)"))
            .is_err());
    }

    #[test]
    fn unsafe_metadata_string_rejected() {
        let mut req = request("t", "m");
        req.metadata.insert(
            "detail".to_string(),
            serde_json::json!({"nested": ["fine", "<script>bad</script>"]}),
        );
        assert!(filter().filter(req).is_err());
    }

    #[test]
    fn clean_metadata_passes() {
        let mut req = request("t", "m");
        req.metadata
            .insert("order_id".to_string(), serde_json::json!("ord_123"));
        req.metadata.insert("total".to_string(), serde_json::json!(42.5));
        assert!(filter().filter(req).is_ok());
    }
}
