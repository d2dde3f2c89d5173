// src/ingest/providers/rss.rs
//! RSS 2.0 feed provider used for the Google, Bing and Yahoo news feeds.
//! Fixture mode parses an in-memory document; HTTP mode fills a URL template
//! per query and downloads it with `reqwest`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{FeedProvider, FeedQuery, FeedSource, RawEntry};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

pub struct RssFeedProvider {
    source: FeedSource,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        template: String,
        client: reqwest::Client,
    },
}

impl RssFeedProvider {
    /// Serve the same XML document for every query.
    pub fn from_fixture(source: FeedSource, xml: &str) -> Self {
        Self {
            source,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    /// `template` may contain `{query}` and `{ticker}` placeholders.
    pub fn from_template(source: FeedSource, template: &str, client: reqwest::Client) -> Self {
        Self {
            source,
            mode: Mode::Http {
                template: template.to_string(),
                client,
            },
        }
    }

    pub fn parse_entries(xml: &str) -> Result<Vec<RawEntry>> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
        Ok(rss
            .channel
            .item
            .into_iter()
            .map(|it| RawEntry {
                title: it
                    .title
                    .map(|t| html_escape::decode_html_entities(&t).into_owned()),
                published: it.pub_date,
            })
            .collect())
    }
}

/// Fill a URL template for `query`. Both values are form-encoded, so spaces
/// become `+` and `&`, `#`, `=` cannot break out of their parameter.
pub fn render_url(template: &str, query: &FeedQuery) -> Result<reqwest::Url> {
    let raw = template
        .replace("{query}", &form_encode(&query.text))
        .replace("{ticker}", &form_encode(&query.ticker));
    reqwest::Url::parse(&raw).with_context(|| format!("invalid feed url {raw:?}"))
}

#[async_trait]
impl FeedProvider for RssFeedProvider {
    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<RawEntry>> {
        match &self.mode {
            Mode::Fixture(xml) => Self::parse_entries(xml),
            Mode::Http { template, client } => {
                let url = render_url(template, query)?;
                let body = client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .with_context(|| format!("{} http get()", self.source))?
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.source))?;
                Self::parse_entries(&body)
            }
        }
    }

    fn source(&self) -> FeedSource {
        self.source
    }
}

fn form_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// quick-xml only knows the five XML entities; feeds routinely carry HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_stay_none() {
        let xml = r#"<rss><channel><title>x</title>
            <item><title>Only a title</title></item>
            <item><pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate></item>
        </channel></rss>"#;
        let out = RssFeedProvider::parse_entries(xml).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title.as_deref(), Some("Only a title"));
        assert!(out[0].published.is_none());
        assert!(out[1].title.is_none());
    }

    #[test]
    fn empty_channel_is_ok() {
        let out = RssFeedProvider::parse_entries("<rss><channel></channel></rss>").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn renders_query_and_ticker() {
        let q = FeedQuery {
            ticker: "AAPL".into(),
            text: "Apple stock".into(),
        };
        let url = render_url("https://example.com/rss?q={query}&s={ticker}", &q).unwrap();
        assert_eq!(url.as_str(), "https://example.com/rss?q=Apple+stock&s=AAPL");
    }

    #[test]
    fn reserved_characters_stay_inside_the_query_value() {
        let q = FeedQuery {
            ticker: "BRK.B".into(),
            text: "AT&T #1 = stock".into(),
        };
        let url = render_url("https://example.com/rss?q={query}&s={ticker}&hl=en", &q).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/rss?q=AT%26T+%231+%3D+stock&s=BRK.B&hl=en"
        );
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("q".to_string(), "AT&T #1 = stock".to_string()));
        assert_eq!(pairs.len(), 3);
        assert!(url.fragment().is_none());
    }
}
