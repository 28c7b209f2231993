use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{decode_entities, format_views, TrackCatalog};
use crate::models::Track;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const SEARCH_MAX_RESULTS: u32 = 20;
const TRENDING_MAX_RESULTS: u32 = 25;
const MUSIC_CATEGORY_ID: u32 = 10;
const TRENDING_REGION: &str = "US";

/// YouTube Data API v3 client. Only the two read paths the player needs:
/// keyword search and the most-popular music chart.
pub struct YoutubeCatalog {
    client: Client,
    api_key: String,
}

impl YoutubeCatalog {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("catalog request failed: {}", resp.status()));
        }
        Ok(resp.json().await?)
    }
}

fn thumb_of(snippet: &Value) -> String {
    let thumbs = &snippet["thumbnails"];
    thumbs["high"]["url"]
        .as_str()
        .or_else(|| thumbs["medium"]["url"].as_str())
        .unwrap_or("")
        .to_string()
}

/// Search results carry the video id nested under `id.videoId`; entries
/// without one (channels, playlists) are dropped.
pub(crate) fn parse_search_items(items: &Value) -> Vec<Track> {
    let Some(items) = items.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let id = item["id"]["videoId"].as_str()?;
            let snippet = &item["snippet"];
            Some(Track {
                id: id.to_string(),
                title: decode_entities(snippet["title"].as_str().unwrap_or_default()),
                artist: decode_entities(snippet["channelTitle"].as_str().unwrap_or_default()),
                thumb_url: thumb_of(snippet),
                views: None,
            })
        })
        .collect()
}

/// Chart results carry the id as a plain string and a `statistics` block;
/// the view count arrives as a decimal string.
pub(crate) fn parse_trending_items(items: &Value) -> Vec<Track> {
    let Some(items) = items.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let id = item["id"]
                .as_str()
                .or_else(|| item["id"]["videoId"].as_str())?;
            let snippet = &item["snippet"];
            let views = item["statistics"]["viewCount"]
                .as_str()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            Some(Track {
                id: id.to_string(),
                title: decode_entities(snippet["title"].as_str().unwrap_or_default()),
                artist: decode_entities(snippet["channelTitle"].as_str().unwrap_or_default()),
                thumb_url: thumb_of(snippet),
                views: Some(format_views(views)),
            })
        })
        .collect()
}

#[async_trait]
impl TrackCatalog for YoutubeCatalog {
    fn id(&self) -> &str {
        "youtube"
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let q = urlencoding::encode(&format!("{} music", query)).into_owned();
        let url = format!(
            "{}/search?part=snippet&maxResults={}&q={}&type=video&key={}",
            API_BASE, SEARCH_MAX_RESULTS, q, self.api_key
        );
        let body = self.get_json(&url).await?;
        let tracks = parse_search_items(&body["items"]);
        log::debug!("[Catalog] search '{}' returned {} tracks", query, tracks.len());
        Ok(tracks)
    }

    async fn trending(&self) -> Result<Vec<Track>> {
        let url = format!(
            "{}/videos?part=snippet,statistics&chart=mostPopular&videoCategoryId={}&maxResults={}&regionCode={}&key={}",
            API_BASE, MUSIC_CATEGORY_ID, TRENDING_MAX_RESULTS, TRENDING_REGION, self.api_key
        );
        let body = self.get_json(&url).await?;
        let tracks = parse_trending_items(&body["items"]);
        log::debug!("[Catalog] trending returned {} tracks", tracks.len());
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_items_filter_and_decode() {
        let items = json!([
            {
                "id": { "videoId": "abc123" },
                "snippet": {
                    "title": "Don&#39;t Stop &amp; Go",
                    "channelTitle": "Artist &quot;A&quot;",
                    "thumbnails": {
                        "high": { "url": "https://i/hq.jpg" },
                        "medium": { "url": "https://i/mq.jpg" }
                    }
                }
            },
            // a channel result has no videoId and must be dropped
            { "id": { "channelId": "chan1" }, "snippet": { "title": "Chan" } }
        ]);

        let tracks = parse_search_items(&items);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "abc123");
        assert_eq!(tracks[0].title, "Don't Stop & Go");
        assert_eq!(tracks[0].artist, "Artist \"A\"");
        assert_eq!(tracks[0].thumb_url, "https://i/hq.jpg");
        assert_eq!(tracks[0].views, None);
    }

    #[test]
    fn thumbnail_falls_back_medium_then_empty() {
        let items = json!([
            {
                "id": { "videoId": "v1" },
                "snippet": {
                    "title": "T", "channelTitle": "C",
                    "thumbnails": { "medium": { "url": "https://i/mq.jpg" } }
                }
            },
            {
                "id": { "videoId": "v2" },
                "snippet": { "title": "T", "channelTitle": "C" }
            }
        ]);

        let tracks = parse_search_items(&items);
        assert_eq!(tracks[0].thumb_url, "https://i/mq.jpg");
        assert_eq!(tracks[1].thumb_url, "");
    }

    #[test]
    fn trending_items_carry_formatted_views() {
        let items = json!([
            {
                "id": "top1",
                "snippet": {
                    "title": "Hit", "channelTitle": "Star",
                    "thumbnails": { "high": { "url": "https://i/t.jpg" } }
                },
                "statistics": { "viewCount": "2500000" }
            },
            {
                "id": "top2",
                "snippet": { "title": "Sleeper", "channelTitle": "Indie" }
                // no statistics block at all
            }
        ]);

        let tracks = parse_trending_items(&items);
        assert_eq!(tracks[0].views.as_deref(), Some("2.5M"));
        assert_eq!(tracks[1].views.as_deref(), Some("0"));
    }

    #[test]
    fn malformed_items_payload_yields_empty_list() {
        assert!(parse_search_items(&json!(null)).is_empty());
        assert!(parse_trending_items(&json!({"unexpected": true})).is_empty());
    }
}
