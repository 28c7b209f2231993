pub mod youtube;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Track;

#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Unique identifier (e.g., "youtube")
    fn id(&self) -> &str;

    /// Free-text search, normalized to track records.
    async fn search(&self, query: &str) -> Result<Vec<Track>>;

    /// Currently popular music tracks, annotated with a formatted view count.
    async fn trending(&self) -> Result<Vec<Track>>;
}

/// "1.2K" / "3.4M" / "1.0B" style view counts.
pub fn format_views(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}

/// Titles and channel names come back HTML-escaped. Undo the named entities
/// that actually occur plus numeric references; anything unrecognized is
/// left untouched.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let end = match rest.find(';') {
            // longest expected form is a numeric reference like &#x1F3B5;
            Some(e) if e <= 9 => e,
            _ => {
                out.push('&');
                rest = &rest[1..];
                continue;
            }
        };

        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity.strip_prefix('#').and_then(|num| {
                let code = match num.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse().ok(),
                };
                code.and_then(char::from_u32)
            }),
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
