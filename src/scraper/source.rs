use async_trait::async_trait;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Failure taxonomy for the browsing source. `Throttled` is the only
/// item-level variant; the other two end the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source could not be opened or the search was rejected.
    Unavailable(String),
    /// Transient pushback (rate limiting, flaky item page). Worth retrying.
    Throttled(String),
    /// The browsing session died mid-run and cannot recover.
    Crashed(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(reason) => write!(f, "source unavailable: {}", reason),
            SourceError::Throttled(reason) => write!(f, "source throttled: {}", reason),
            SourceError::Crashed(reason) => write!(f, "browsing session crashed: {}", reason),
        }
    }
}

impl std::error::Error for SourceError {}

/// Opaque handle to one search result. `index` is the enumeration position,
/// `url` points at the item's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHandle {
    pub index: usize,
    pub url: String,
}

/// Text fields readable off a single result item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    Name,
    Address,
    Phone,
    Website,
    Rating,
    ReviewsCount,
}

/// One browsing session against the external listings source. Stateful and
/// owned by exactly one extraction run; never shared across sessions.
#[async_trait]
pub trait ListingSource: Send {
    /// Establishes the browsing session.
    async fn open(&mut self) -> SourceResult<()>;

    /// Issues the search for `keywords` at `location`.
    async fn search(&mut self, keywords: &str, location: &str) -> SourceResult<()>;

    /// Enumerates up to `limit` result handles, in result order.
    async fn list_items(&mut self, limit: usize) -> SourceResult<Vec<ItemHandle>>;

    /// Reads one display-text field of an item. `Ok(None)` means the field
    /// is simply absent on this listing.
    async fn read_text(
        &mut self,
        item: &ItemHandle,
        field: ListingField,
    ) -> SourceResult<Option<String>>;

    async fn read_categories(&mut self, item: &ItemHandle) -> SourceResult<Vec<String>>;

    async fn read_hours(&mut self, item: &ItemHandle) -> SourceResult<Option<String>>;

    async fn read_coordinates(&mut self, item: &ItemHandle) -> SourceResult<Option<(f64, f64)>>;
}
