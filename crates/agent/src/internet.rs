//! Internet adapter (spec.md §6.4): a bounded DuckDuckGo Instant-Answers
//! search plus a minimal page-text fetch, grounded on the teacher's
//! `WebSearchTool`/`fetch_page_excerpt` but stripped to the narrower
//! contract the Explore task actually needs.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// One search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub title: String,
    pub body: String,
    pub href: String,
}

#[derive(Debug, Deserialize, Default)]
struct DuckDuckGoResponse {
    #[serde(rename = "AbstractText")]
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    #[serde(rename = "Heading")]
    heading: String,
    #[serde(rename = "RelatedTopics")]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize, Default)]
struct RelatedTopic {
    #[serde(rename = "Text")]
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
}

/// `search(query) -> Seq<{title,body,href}>`, bounded by `max_results` and
/// `timeout`. Returns an empty vector (logged) rather than an error on any
/// network or parse failure, since Explore treats "nothing found" and
/// "search failed" identically.
pub async fn search(query: &str, max_results: usize, timeout: Duration) -> Vec<SearchResult> {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(?e, "failed to build internet search client");
            return Vec::new();
        }
    };

    let response = client
        .get("https://api.duckduckgo.com/")
        .query(&[("q", query), ("format", "json"), ("no_html", "1")])
        .send()
        .await;

    let payload: DuckDuckGoResponse = match response {
        Ok(resp) => match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(?e, query, "internet search response was not parseable");
                return Vec::new();
            }
        },
        Err(e) => {
            warn!(?e, query, "internet search request failed");
            return Vec::new();
        }
    };

    let mut results = Vec::new();
    if !payload.abstract_text.is_empty() {
        results.push(SearchResult {
            title: if payload.heading.is_empty() { query.to_string() } else { payload.heading.clone() },
            body: payload.abstract_text,
            href: payload.abstract_url,
        });
    }
    for topic in payload.related_topics {
        if results.len() >= max_results {
            break;
        }
        let (Some(text), Some(href)) = (topic.text, topic.first_url) else { continue };
        results.push(SearchResult {
            title: text.split(" - ").next().unwrap_or(&text).to_string(),
            body: text,
            href,
        });
    }
    results.truncate(max_results);
    results
}

/// `fetch(url) -> Text?`: bare HTML-tag stripping, no script/style
/// filtering beyond that — good enough for the short discovery blurbs the
/// Explore task stores, not a general-purpose page reader.
pub async fn fetch(url: &str, timeout: Duration) -> Option<String> {
    let client = reqwest::Client::builder().timeout(timeout).build().ok()?;
    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;
    Some(html_to_text(&body))
}

fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_text_strips_tags_and_collapses_whitespace() {
        let html = "<html><body>  <p>Hello   <b>world</b></p></body></html>";
        assert_eq!(html_to_text(html), "Hello world");
    }
}
