use tracing::debug;

use crate::models::{Business, Coordinates};
use crate::scraper::source::{ItemHandle, ListingField, ListingSource, SourceError};

/// Pulls one best-effort record off a result item. The name is the only
/// mandatory field: an item without one is unextractable and yields
/// `Ok(None)`. Optional fields are fetched independently — a failed lookup
/// costs that field, never the record. Errors on the name read bubble up so
/// the orchestrator can apply its retry/abort policy.
pub async fn extract_listing<S: ListingSource + ?Sized>(
    source: &mut S,
    item: &ItemHandle,
) -> Result<Option<Business>, SourceError> {
    let name = match source.read_text(item, ListingField::Name).await? {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Ok(None),
    };

    let address = optional_text(source, item, ListingField::Address).await;
    let phone = optional_text(source, item, ListingField::Phone).await;
    let website = optional_text(source, item, ListingField::Website).await;

    let rating = optional_text(source, item, ListingField::Rating)
        .await
        .and_then(|text| parse_rating(&text));
    let reviews_count = optional_text(source, item, ListingField::ReviewsCount)
        .await
        .and_then(|text| parse_reviews_count(&text));

    let categories = match source.read_categories(item).await {
        Ok(categories) => categories,
        Err(e) => {
            debug!("category lookup failed on item {}: {}", item.index, e);
            Vec::new()
        }
    };

    let hours = match source.read_hours(item).await {
        Ok(hours) => hours,
        Err(e) => {
            debug!("hours lookup failed on item {}: {}", item.index, e);
            None
        }
    };

    let coordinates = match source.read_coordinates(item).await {
        Ok(pair) => pair.map(|(lat, lng)| Coordinates { lat, lng }),
        Err(e) => {
            debug!("coordinate lookup failed on item {}: {}", item.index, e);
            None
        }
    };

    Ok(Some(Business {
        name,
        address,
        phone,
        website,
        rating,
        reviews_count,
        categories,
        hours,
        coordinates,
    }))
}

async fn optional_text<S: ListingSource + ?Sized>(
    source: &mut S,
    item: &ItemHandle,
    field: ListingField,
) -> Option<String> {
    match source.read_text(item, field).await {
        Ok(Some(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Ok(None) => None,
        Err(e) => {
            debug!("{:?} lookup failed on item {}: {}", field, item.index, e);
            None
        }
    }
}

/// Parses display text like "4.5" or "4,5 stars" into a rating. Unparsable
/// or out-of-range text yields None, never a default.
pub fn parse_rating(text: &str) -> Option<f64> {
    let token = text.split_whitespace().next()?;
    let value: f64 = token.replace(',', ".").parse().ok()?;
    if (0.0..=5.0).contains(&value) {
        Some(value)
    } else {
        None
    }
}

/// Parses review-count display text like "(1,234 reviews)" into a count.
pub fn parse_reviews_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
