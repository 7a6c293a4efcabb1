use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::config::ScrapingConfig;
use crate::scraper::source::{
    ItemHandle, ListingField, ListingSource, SourceError, SourceResult,
};

const MAPS_BASE_URL: &str = "https://www.google.com/maps";

/// Browsing session over the maps search interface: plain HTTP fetches
/// parsed with CSS selectors. One client per extraction session; the last
/// fetched search page and item page are cached so repeated field reads of
/// the same item cost one request.
pub struct MapsClient {
    client: Client,
    coords_regex: Regex,
    search_page: Option<String>,
    item_page: Option<(usize, String)>,
}

impl MapsClient {
    pub fn new(config: &ScrapingConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            coords_regex: Regex::new(r"@(-?\d+\.?\d*),(-?\d+\.?\d*)").unwrap(),
            search_page: None,
            item_page: None,
        }
    }

    async fn fetch(&self, url: &str) -> SourceResult<String> {
        debug!("fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Crashed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // 429/5xx are pushback worth retrying; anything else on an item
            // page is treated the same way and skipped after retries.
            return Err(SourceError::Throttled(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Crashed(e.to_string()))
    }

    async fn load_item(&mut self, item: &ItemHandle) -> SourceResult<()> {
        if matches!(&self.item_page, Some((index, _)) if *index == item.index) {
            return Ok(());
        }
        let html = self.fetch(&item.url).await?;
        self.item_page = Some((item.index, html));
        Ok(())
    }

    fn item_html(&self) -> &str {
        self.item_page
            .as_ref()
            .map(|(_, html)| html.as_str())
            .unwrap_or("")
    }
}

#[async_trait]
impl ListingSource for MapsClient {
    async fn open(&mut self) -> SourceResult<()> {
        self.fetch(MAPS_BASE_URL)
            .await
            .map_err(into_unavailable)?;
        Ok(())
    }

    async fn search(&mut self, keywords: &str, location: &str) -> SourceResult<()> {
        let query = format!("{} in {}", keywords, location);
        let url = Url::parse(&format!("{}/search/{}", MAPS_BASE_URL, query))
            .map_err(|e| SourceError::Unavailable(format!("bad search url: {}", e)))?;

        let html = self.fetch(url.as_str()).await.map_err(into_unavailable)?;
        self.search_page = Some(html);
        self.item_page = None;
        Ok(())
    }

    async fn list_items(&mut self, limit: usize) -> SourceResult<Vec<ItemHandle>> {
        let html = self.search_page.as_deref().ok_or_else(|| {
            SourceError::Unavailable("no search has been issued".to_string())
        })?;

        Ok(parse_result_links(html)
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, url)| ItemHandle { index, url })
            .collect())
    }

    async fn read_text(
        &mut self,
        item: &ItemHandle,
        field: ListingField,
    ) -> SourceResult<Option<String>> {
        self.load_item(item).await?;
        let html = self.item_html();

        Ok(match field {
            ListingField::Name => select_text(html, "div.fontHeadlineSmall"),
            ListingField::Address => select_text(html, "button[data-item-id='address']"),
            ListingField::Phone => select_text(html, "button[data-item-id='phone:tel']"),
            ListingField::Website => select_attr(html, "a[data-item-id='authority']", "href"),
            ListingField::Rating => select_text(html, "span.fontDisplayLarge"),
            ListingField::ReviewsCount => {
                select_text(html, "button[jsaction='pane.rating.moreReviews']")
            }
        })
    }

    async fn read_categories(&mut self, item: &ItemHandle) -> SourceResult<Vec<String>> {
        self.load_item(item).await?;
        Ok(parse_categories(self.item_html()))
    }

    async fn read_hours(&mut self, item: &ItemHandle) -> SourceResult<Option<String>> {
        self.load_item(item).await?;
        Ok(parse_hours(self.item_html()))
    }

    async fn read_coordinates(&mut self, item: &ItemHandle) -> SourceResult<Option<(f64, f64)>> {
        // The place URL carries the coordinates; no page fetch needed.
        Ok(parse_coordinates(&item.url, &self.coords_regex))
    }
}

/// Open/search failures are session-fatal whatever their shape.
fn into_unavailable(e: SourceError) -> SourceError {
    match e {
        SourceError::Unavailable(_) => e,
        SourceError::Throttled(reason) | SourceError::Crashed(reason) => {
            SourceError::Unavailable(reason)
        }
    }
}

/// Place links off the search page, in result order, deduplicated.
fn parse_result_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").unwrap();

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains("/maps/place/") {
            continue;
        }
        let absolute = if href.starts_with("http") {
            href.to_string()
        } else {
            let Ok(base) = Url::parse(MAPS_BASE_URL) else {
                continue;
            };
            match base.join(href) {
                Ok(url) => url.to_string(),
                Err(_) => continue,
            }
        };
        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }
    links
}

fn select_text(html: &str, selector: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn select_attr(html: &str, selector: &str, attr: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.to_string())
        .filter(|value| !value.is_empty())
}

fn parse_categories(html: &str) -> Vec<String> {
    select_text(html, "button[jsaction='pane.rating.category']")
        .map(|text| {
            text.split('·')
                .map(|category| category.trim().to_string())
                .filter(|category| !category.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Opening hours table flattened to "Day: range; Day: range".
fn parse_hours(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table tr").unwrap();
    let day_selector = Selector::parse("th").unwrap();
    let range_selector = Selector::parse("td").unwrap();

    let mut entries = Vec::new();
    for row in document.select(&row_selector) {
        let day = row
            .select(&day_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());
        let range = row
            .select(&range_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());
        if let (Some(day), Some(range)) = (day, range) {
            if !day.is_empty() && !range.is_empty() {
                entries.push(format!("{}: {}", day, range));
            }
        }
    }

    if entries.is_empty() {
        None
    } else {
        Some(entries.join("; "))
    }
}

fn parse_coordinates(url: &str, regex: &Regex) -> Option<(f64, f64)> {
    let caps = regex.captures(url)?;
    let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
    let lng: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_links_keep_order_and_dedupe() {
        let html = r#"
            <div role="feed">
                <a href="https://www.google.com/maps/place/First/@47.6,-122.3,17z">First</a>
                <a href="/maps/place/Second">Second</a>
                <a href="https://www.google.com/maps/place/First/@47.6,-122.3,17z">First again</a>
                <a href="/maps/help">Not a place</a>
                <a href="/maps/place/Third">Third</a>
            </div>
        "#;

        let links = parse_result_links(html);
        assert_eq!(links.len(), 3);
        assert!(links[0].contains("/maps/place/First"));
        assert!(links[1].ends_with("/maps/place/Second"));
        assert!(links[2].ends_with("/maps/place/Third"));
    }

    #[test]
    fn selector_reads_pull_the_expected_fields() {
        let html = r#"
            <div class="fontHeadlineSmall">Storyville Coffee</div>
            <button data-item-id="address">94 Pike St, Seattle, WA</button>
            <button data-item-id="phone:tel">(206) 555-0100</button>
            <a data-item-id="authority" href="https://storyville.example">Website</a>
            <span class="fontDisplayLarge">4.6</span>
            <button jsaction="pane.rating.moreReviews">2,311 reviews</button>
        "#;

        assert_eq!(
            select_text(html, "div.fontHeadlineSmall").as_deref(),
            Some("Storyville Coffee")
        );
        assert_eq!(
            select_text(html, "button[data-item-id='address']").as_deref(),
            Some("94 Pike St, Seattle, WA")
        );
        assert_eq!(
            select_attr(html, "a[data-item-id='authority']", "href").as_deref(),
            Some("https://storyville.example")
        );
        assert_eq!(
            select_text(html, "span.fontDisplayLarge").as_deref(),
            Some("4.6")
        );
    }

    #[test]
    fn missing_elements_read_as_none() {
        let html = "<div class=\"fontHeadlineSmall\">Name Only</div>";
        assert_eq!(select_text(html, "button[data-item-id='address']"), None);
        assert_eq!(select_attr(html, "a[data-item-id='authority']", "href"), None);
        assert!(parse_categories(html).is_empty());
        assert_eq!(parse_hours(html), None);
    }

    #[test]
    fn categories_split_on_separator() {
        let html = r#"<button jsaction="pane.rating.category">Coffee shop · Cafe · Bakery</button>"#;
        assert_eq!(parse_categories(html), vec!["Coffee shop", "Cafe", "Bakery"]);
    }

    #[test]
    fn hours_table_is_flattened() {
        let html = r#"
            <table>
                <tr><th>Monday</th><td>7 AM–6 PM</td></tr>
                <tr><th>Tuesday</th><td>7 AM–6 PM</td></tr>
            </table>
        "#;
        assert_eq!(
            parse_hours(html).as_deref(),
            Some("Monday: 7 AM–6 PM; Tuesday: 7 AM–6 PM")
        );
    }

    #[test]
    fn coordinates_come_from_the_place_url() {
        let regex = Regex::new(r"@(-?\d+\.?\d*),(-?\d+\.?\d*)").unwrap();
        let pair = parse_coordinates(
            "https://www.google.com/maps/place/X/@47.6062,-122.3321,17z",
            &regex,
        )
        .unwrap();
        assert!((pair.0 - 47.6062).abs() < 1e-9);
        assert!((pair.1 + 122.3321).abs() < 1e-9);

        assert_eq!(
            parse_coordinates("https://www.google.com/maps/place/NoCoords", &regex),
            None
        );
    }
}
