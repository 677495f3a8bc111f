// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::config::SourceConfig;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

pub const UNKNOWN_TITLE: &str = "Unknown";

/// One discovered video candidate.
///
/// `published` is kept as the raw ISO-8601 string from the feed so that
/// ordering is plain string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub title: String,
    pub published: String,
    pub url: String,
    #[serde(rename = "playlist")]
    pub source_label: String,
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.source_label, self.title)
    }
}

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Published,
}

/// Child elements of the first entry as they are read.
#[derive(Debug, Default)]
struct PartialEntry {
    title: Option<String>,
    published: Option<String>,
    // Outer `Some` once the first link was seen, inner is its href
    link: Option<Option<String>>,
    reading: Option<Field>,
}

impl PartialEntry {
    fn open_child(&mut self, name: &[u8], element: &BytesStart<'_>) -> Result<()> {
        match name {
            b"title" if self.title.is_none() => {
                self.title = Some(String::new());
                self.reading = Some(Field::Title);
            }
            b"published" if self.published.is_none() => {
                self.published = Some(String::new());
                self.reading = Some(Field::Published);
            }
            b"link" if self.link.is_none() => {
                let href = element
                    .try_get_attribute("href")?
                    .map(|attr| attr.unescape_value().map(|v| v.into_owned()))
                    .transpose()?;
                self.link = Some(href);
            }
            _ => {}
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        let target = match self.reading {
            Some(Field::Title) => self.title.as_mut(),
            Some(Field::Published) => self.published.as_mut(),
            None => None,
        };
        if let Some(target) = target {
            target.push_str(text);
        }
    }

    fn finish(self, source_label: &str) -> Option<Entry> {
        let url = self.link.flatten().filter(|href| !href.is_empty())?;
        Some(Entry {
            title: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            published: self.published.unwrap_or_default(),
            url,
            source_label: source_label.to_string(),
        })
    }
}

/// Extracts the first entry of an Atom document.
///
/// Only `feed`, `entry` and their children in the Atom namespace count;
/// anything else is skipped. Returns `Ok(None)` when there is no entry or
/// the first entry has no usable link. Documents that are not well-formed
/// XML are errors.
pub fn parse_latest(source_label: &str, xml: &str) -> Result<Option<Entry>> {
    let mut reader = NsReader::from_str(xml);
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut entry: Option<PartialEntry> = None;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .context("Failed to parse feed XML")?;
        let atom = matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == ATOM_NS);

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                let level = depth + 1;
                let name = e.local_name();

                match level {
                    1 => {
                        seen_root = true;
                        if !atom || name.as_ref() != b"feed" || empty {
                            return Ok(None);
                        }
                    }
                    2 if entry.is_none() && atom && name.as_ref() == b"entry" => {
                        if empty {
                            return Ok(None);
                        }
                        entry = Some(PartialEntry::default());
                    }
                    3 if atom => {
                        if let Some(entry) = entry.as_mut() {
                            entry.open_child(name.as_ref(), e)?;
                            if empty {
                                entry.reading = None;
                            }
                        }
                    }
                    _ => {}
                }

                if !empty {
                    depth = level;
                }
            }
            Event::End(_) => {
                match depth {
                    2 => {
                        if let Some(entry) = entry.take() {
                            return Ok(entry.finish(source_label));
                        }
                    }
                    3 => {
                        if let Some(entry) = entry.as_mut() {
                            entry.reading = None;
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(ref t) if depth == 3 => {
                if let Some(entry) = entry.as_mut() {
                    entry.push_text(&t.unescape()?);
                }
            }
            Event::CData(ref c) if depth == 3 => {
                if let Some(entry) = entry.as_mut() {
                    entry.push_text(&String::from_utf8_lossy(c));
                }
            }
            Event::Eof => {
                if !seen_root {
                    anyhow::bail!("Feed document has no root element");
                }
                if depth > 0 {
                    anyhow::bail!("Unexpected end of feed document");
                }
                return Ok(None);
            }
            _ => {}
        }
    }
}

pub struct FeedClient {
    client: Client,
    base_url: String,
    progress: ProgressBar,
}

impl FeedClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("drumcode/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Show a spinner on stderr while feeds are being fetched. Hidden
    /// automatically when stderr is not a terminal.
    pub fn enable_progress(&mut self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        self.progress = pb;
    }

    pub fn finish_progress(&self) {
        self.progress.finish_and_clear();
    }

    pub fn feed_url(&self, playlist_id: &str) -> String {
        format!("{}{}", self.base_url, playlist_id)
    }

    /// Fetch a source's feed and return its newest entry.
    ///
    /// Transport failures are reported on stderr and yield `None`, as do
    /// feeds without a playable entry.
    pub async fn fetch_latest(&self, source: &SourceConfig) -> Option<Entry> {
        self.progress.set_message(format!("Fetching {}…", source.name));

        let url = self.feed_url(&source.playlist_id);
        debug!("Requesting feed for {}: {}", source.name, url);

        let body = match self.fetch_document(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Fetch failed for {}: {:#}", source.name, e);
                self.progress
                    .suspend(|| eprintln!("Failed to fetch {}: {:#}", source.name, e));
                return None;
            }
        };

        match parse_latest(&source.name, &body) {
            Ok(Some(entry)) => {
                debug!("Latest in {}: {} ({})", source.name, entry.title, entry.published);
                Some(entry)
            }
            Ok(None) => {
                debug!("No playable entry in feed for {}", source.name);
                None
            }
            Err(e) => {
                debug!("Discarding malformed feed for {}: {:#}", source.name, e);
                None
            }
        }
    }

    async fn fetch_document(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP request failed with status: {}",
                response.status()
            ));
        }

        response
            .text()
            .await
            .with_context(|| "Failed to read response body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <link rel="self" href="http://www.youtube.com/feeds/videos.xml?playlist_id=PLx"/>
 <id>yt:playlist:PLx</id>
 <title>Drumcode Radio</title>
 <author>
  <name>Drumcode</name>
  <uri>https://www.youtube.com/channel/UCx</uri>
 </author>
 <published>2019-01-01T00:00:00+00:00</published>
 <entry>
  <id>yt:video:abc</id>
  <yt:videoId>abc</yt:videoId>
  <title>Drumcode Radio 800</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=abc"/>
  <published>2024-03-01T10:00:00+00:00</published>
  <updated>2024-03-02T10:00:00+00:00</updated>
  <media:group>
   <media:title>Drumcode Radio 800</media:title>
   <media:description>Two hours of techno</media:description>
  </media:group>
 </entry>
 <entry>
  <id>yt:video:def</id>
  <title>Drumcode Radio 799</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=def"/>
  <published>2024-02-23T10:00:00+00:00</published>
 </entry>
</feed>"#;

    #[test]
    fn extracts_first_entry() {
        let entry = parse_latest("Drumcode Radio", FEED).unwrap().unwrap();
        assert_eq!(entry.title, "Drumcode Radio 800");
        assert_eq!(entry.published, "2024-03-01T10:00:00+00:00");
        assert_eq!(entry.url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(entry.source_label, "Drumcode Radio");
    }

    #[test]
    fn missing_title_and_published_fall_back() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><link href="https://example.com/v"/></entry>
</feed>"#;
        let entry = parse_latest("S", xml).unwrap().unwrap();
        assert_eq!(entry.title, UNKNOWN_TITLE);
        assert_eq!(entry.published, "");
        assert_eq!(entry.url, "https://example.com/v");
    }

    #[test]
    fn feed_without_entries_is_absent() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Empty</title></feed>"#;
        assert!(parse_latest("S", xml).unwrap().is_none());
    }

    #[test]
    fn entry_without_link_is_absent() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>No link</title><published>2024-01-01T00:00:00Z</published></entry>
</feed>"#;
        assert!(parse_latest("S", xml).unwrap().is_none());
    }

    #[test]
    fn link_without_href_is_absent() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>Bad link</title><link rel="alternate"/></entry>
</feed>"#;
        assert!(parse_latest("S", xml).unwrap().is_none());
    }

    #[test]
    fn interleaved_elements_do_not_hide_the_first_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title>T</title>
    <link href="https://x/1"/>
    <category term="techno"/>
    <link rel="related" href="https://x/other"/>
  </entry>
  <updated>z</updated>
  <entry><title>U</title><link href="https://x/2"/></entry>
</feed>"#;
        let entry = parse_latest("S", xml).unwrap().unwrap();
        assert_eq!(entry.title, "T");
        assert_eq!(entry.url, "https://x/1");
    }

    #[test]
    fn first_entry_wins_even_without_link() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>No link</title></entry>
  <entry><title>Later</title><link href="https://x/2"/></entry>
</feed>"#;
        assert!(parse_latest("S", xml).unwrap().is_none());
    }

    #[test]
    fn nested_and_foreign_elements_are_not_fields() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
  <entry>
    <media:title>Foreign</media:title>
    <media:group><title>Nested</title></media:group>
    <link href="https://x/1"/>
  </entry>
</feed>"#;
        let entry = parse_latest("S", xml).unwrap().unwrap();
        assert_eq!(entry.title, UNKNOWN_TITLE);
    }

    #[test]
    fn escaped_text_is_decoded() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>Beyer &amp; Cox</title><link href="https://x/?a=1&amp;b=2"/></entry>
</feed>"#;
        let entry = parse_latest("S", xml).unwrap().unwrap();
        assert_eq!(entry.title, "Beyer & Cox");
        assert_eq!(entry.url, "https://x/?a=1&b=2");
    }

    #[test]
    fn other_namespaces_are_not_atom() {
        let xml = r#"<feed xmlns="urn:other">
  <entry><title>T</title><link href="https://x/1"/></entry>
</feed>"#;
        assert!(parse_latest("S", xml).unwrap().is_none());

        let no_ns = r#"<feed><entry><title>T</title><link href="https://x/1"/></entry></feed>"#;
        assert!(parse_latest("S", no_ns).unwrap().is_none());
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(parse_latest("S", "not xml at all").is_err());
        assert!(
            parse_latest("S", r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>x"#)
                .is_err()
        );
        assert!(
            parse_latest(
                "S",
                r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>x</link></entry></feed>"#
            )
            .is_err()
        );
    }

    #[test]
    fn feed_url_is_concatenated() {
        let client = FeedClient::new("https://example.com/feed?playlist_id=").unwrap();
        assert_eq!(
            client.feed_url("PL123"),
            "https://example.com/feed?playlist_id=PL123"
        );
    }

    fn local_client(base_url: &str) -> FeedClient {
        let client = Client::builder().no_proxy().build().unwrap();
        FeedClient::with_client(base_url, client)
    }

    /// Serve one canned HTTP response on a local port and return a base URL
    /// pointing at it.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/feeds?playlist_id=", addr)
    }

    #[tokio::test]
    async fn unreachable_source_is_absent() {
        let client = local_client("http://127.0.0.1:1/feeds?playlist_id=");
        let source = SourceConfig::new("Down", "PL1");
        assert!(client.fetch_latest(&source).await.is_none());
    }

    #[tokio::test]
    async fn error_status_is_a_transport_failure() {
        let base = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let client = local_client(&base);

        let err = client.fetch_document(&client.feed_url("PL1")).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn error_status_source_is_absent() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let client = local_client(&base);
        let source = SourceConfig::new("Missing", "PL1");
        assert!(client.fetch_latest(&source).await.is_none());
    }

    #[tokio::test]
    async fn fetches_latest_entry_over_http() {
        const RESPONSE: &str = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: application/atom+xml\r\n",
            "Content-Length: 109\r\n",
            "Connection: close\r\n\r\n",
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>Live</title><link href="https://x/1"/></entry></feed>"#
        );
        let base = serve_once(RESPONSE).await;
        let client = local_client(&base);
        let source = SourceConfig::new("Live Sets", "PL1");

        let entry = client.fetch_latest(&source).await.unwrap();
        assert_eq!(entry.title, "Live");
        assert_eq!(entry.url, "https://x/1");
        assert_eq!(entry.source_label, "Live Sets");
    }
}
