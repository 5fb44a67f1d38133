//! Text helpers shared by exports and HTML views

use chrono::{DateTime, Utc};
use scraper::Html;

/// Convert HTML-bearing note content to plain text.
///
/// Markup is dropped, entities are decoded and non-breaking spaces become
/// ordinary spaces.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();

    text.replace('\u{a0}', " ").trim().to_string()
}

/// Escape text for safe inclusion in HTML
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Short relative time such as "just now", "5m ago" or "3d ago"
pub fn human_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds();

    if secs < 60 {
        return "just now".to_string();
    }
    if secs < 3600 {
        return format!("{}m ago", secs / 60);
    }
    if secs < 86_400 {
        return format!("{}h ago", secs / 3600);
    }

    let days = secs / 86_400;
    if days < 30 {
        format!("{}d ago", days)
    } else {
        format!("{}mo ago", days / 30)
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
