use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::io::loader::unescape_xml;
use crate::transcript::{extract_document_date, DATE_SCAN_LINES};

/// Language preference order for transcript lookup.
pub const DEFAULT_TRANSCRIPT_LANGS: [&str; 4] = ["lt", "lt-LT", "en", "en-US"];

const METADATA_TIMEOUT_SECS: u64 = 10;

lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref CUE_RE: Regex =
        Regex::new(r"(?s)<text(?:\s[^>]*[^/>]|\s)?>(.*?)</text>").unwrap();
}

/// Failures while resolving an external video source.
#[derive(Debug, Error, PartialEq)]
pub enum SourceError {
    #[error("YouTube URL is empty")]
    EmptyUrl,

    #[error("Unable to extract video ID from URL")]
    InvalidVideoId,

    #[error("Transkripcija nerasta šiam vaizdo įrašui")]
    TranscriptNotFound,

    #[error("Transkripcija tuščia")]
    EmptyTranscript,

    #[error("Nepavyko nuskaityti YouTube transkripcijos: {0}")]
    TranscriptFetch(String),
}

/// Resolved metadata for one video.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub video_id: String,
    /// Fetched title, or the id when the title lookup failed.
    pub title: String,
    /// Document date parsed out of the title, when present.
    pub date_label: Option<String>,
    /// Localized warning when the title lookup failed.
    pub warning: Option<String>,
}

/// Extract the 11-character video id from a URL or bare id string.
pub fn extract_video_id(url: &str) -> Result<String, SourceError> {
    let candidate = url.trim();
    if candidate.is_empty() {
        return Err(SourceError::EmptyUrl);
    }

    let video_id = match Url::parse(candidate) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("").to_lowercase();
            let path = parsed.path();
            if host == "youtu.be" || host == "www.youtu.be" {
                path.trim_start_matches('/').to_string()
            } else if host.contains("youtube.com") {
                if path == "/watch" {
                    parsed
                        .query_pairs()
                        .find(|(key, _)| key == "v")
                        .map(|(_, value)| value.into_owned())
                        .unwrap_or_default()
                } else if path.starts_with("/shorts/") || path.starts_with("/embed/") {
                    path.split('/').nth(2).unwrap_or_default().to_string()
                } else {
                    String::new()
                }
            } else {
                String::new()
            }
        }
        // Not an absolute URL: treat the whole string as a candidate id
        Err(_) => candidate.to_string(),
    };

    if !VIDEO_ID_RE.is_match(&video_id) {
        return Err(SourceError::InvalidVideoId);
    }
    Ok(video_id)
}

/// Build the speaker-index key for an ingested video.
pub fn source_label(video_id: &str, title: &str) -> String {
    format!("YouTube {video_id}: {title}")
}

/// Parse timedtext XML into cleaned cue strings.
///
/// Cue text is entity-unescaped, newlines are flattened to spaces, and
/// blank cues are dropped.
pub fn parse_timedtext(xml: &str) -> Vec<String> {
    CUE_RE
        .captures_iter(xml)
        .filter_map(|cue| {
            let text = unescape_xml(&cue[1].replace("&#39;", "'"))
                .replace('\n', " ")
                .trim()
                .to_string();
            if text.is_empty() { None } else { Some(text) }
        })
        .collect()
}

/// Client for YouTube metadata and transcript lookups.
pub struct YoutubeClient {
    client: Client,
}

impl Default for YoutubeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YoutubeClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(METADATA_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Resolve the video id, title, and any date found in the title.
    ///
    /// A failed title lookup degrades to a warning with the id standing in
    /// for the title; only an unusable URL is an error.
    pub async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, SourceError> {
        let video_id = extract_video_id(url)?;
        let oembed_url = format!(
            "https://www.youtube.com/oembed?format=json&url={}",
            urlencoding::encode(url.trim())
        );

        match self.fetch_title(&oembed_url).await {
            Ok(title) => {
                let date_label = extract_document_date(&title, DATE_SCAN_LINES);
                Ok(VideoMetadata {
                    video_id,
                    title,
                    date_label,
                    warning: None,
                })
            }
            Err(err) => Ok(VideoMetadata {
                title: video_id.clone(),
                video_id,
                date_label: None,
                warning: Some(format!("Nepavyko gauti vaizdo įrašo pavadinimo: {err}")),
            }),
        }
    }

    async fn fetch_title(&self, oembed_url: &str) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(oembed_url)
            .send()
            .await?
            .error_for_status()?;
        let body: OembedResponse = response.json().await?;
        Ok(body.title.trim().to_string())
    }

    /// Download transcript cues, trying each language in preference order.
    pub async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: Option<&[&str]>,
    ) -> Result<Vec<String>, SourceError> {
        let langs = languages.unwrap_or(&DEFAULT_TRANSCRIPT_LANGS);

        for lang in langs {
            let url = format!(
                "https://video.google.com/timedtext?lang={}&v={}",
                urlencoding::encode(lang),
                urlencoding::encode(video_id)
            );
            let body = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|err| SourceError::TranscriptFetch(err.to_string()))?
                .text()
                .await
                .map_err(|err| SourceError::TranscriptFetch(err.to_string()))?;

            let segments = parse_timedtext(&body);
            if !segments.is_empty() {
                return Ok(segments);
            }
        }
        Err(SourceError::TranscriptNotFound)
    }
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    #[serde(default)]
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_id_from_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_id_from_short_link() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_id_from_shorts_and_embed_paths() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_bare_id_is_accepted() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_empty_url_is_rejected() {
        assert_eq!(extract_video_id("   "), Err(SourceError::EmptyUrl));
    }

    #[test]
    fn test_wrong_host_and_bad_ids_are_rejected() {
        assert_eq!(
            extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"),
            Err(SourceError::InvalidVideoId)
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=trumpas"),
            Err(SourceError::InvalidVideoId)
        );
        assert_eq!(
            extract_video_id("ne id"),
            Err(SourceError::InvalidVideoId)
        );
    }

    #[test]
    fn test_parse_timedtext_cleans_cues() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="utf-8"?><transcript>"#,
            r#"<text start="0.0" dur="2.1">Laba&#39;s
diena</text>"#,
            r#"<text start="2.1" dur="1.0">   </text>"#,
            r#"<text start="3.1" dur="1.0">antra &amp; eilutė</text>"#,
            r#"</transcript>"#,
        );
        let cues = parse_timedtext(xml);
        assert_eq!(cues, vec!["Laba's diena", "antra & eilutė"]);
    }

    #[test]
    fn test_source_label_shape() {
        assert_eq!(
            source_label("dQw4w9WgXcQ", "Posėdis 2023-05-07"),
            "YouTube dQw4w9WgXcQ: Posėdis 2023-05-07"
        );
    }
}
