//! Book catalogue types shared by search, chat tools, and stored messages.
//!
//! `Book` is the summary card returned by searches and stored alongside
//! assistant messages. `BookDetails` is the richer single-volume view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default number of results per search.
pub const DEFAULT_MAX_RESULTS: u8 = 10;
/// Largest page size the catalogue accepts.
pub const MAX_RESULTS_LIMIT: u8 = 40;

/// Validation failures for catalogue requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookQueryValidationError {
    EmptyQuery,
    MaxResultsOutOfRange { value: i64 },
    InvalidOrderBy { value: String },
    NegativeStartIndex { value: i64 },
    InvalidBookId,
}

impl BookQueryValidationError {
    /// Payload field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "query",
            Self::MaxResultsOutOfRange { .. } => "maxResults",
            Self::InvalidOrderBy { .. } => "orderBy",
            Self::NegativeStartIndex { .. } => "startIndex",
            Self::InvalidBookId => "bookId",
        }
    }
}

impl fmt::Display for BookQueryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "search query must not be empty"),
            Self::MaxResultsOutOfRange { value } => write!(
                f,
                "maxResults must be between 1 and {MAX_RESULTS_LIMIT} (got {value})"
            ),
            Self::InvalidOrderBy { value } => {
                write!(f, "orderBy must be relevance or newest (got {value})")
            }
            Self::NegativeStartIndex { value } => {
                write!(f, "startIndex must not be negative (got {value})")
            }
            Self::InvalidBookId => write!(f, "book id must be a non-empty volume identifier"),
        }
    }
}

impl std::error::Error for BookQueryValidationError {}

/// Catalogue volume identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId(String);

impl BookId {
    /// Validate a volume identifier. Identifiers become URL path segments, so
    /// separators and whitespace are rejected.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BookQueryValidationError> {
        let trimmed = raw.as_ref().trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(BookQueryValidationError::InvalidBookId)
        }
    }
}

impl AsRef<str> for BookId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<BookId> for String {
    fn from(value: BookId) -> Self {
        value.0
    }
}

impl TryFrom<String> for BookId {
    type Error = BookQueryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Search ordering supported by the catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Relevance,
    Newest,
}

impl OrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Newest => "newest",
        }
    }
}

impl FromStr for OrderBy {
    type Err = BookQueryValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "newest" => Ok(Self::Newest),
            other => Err(BookQueryValidationError::InvalidOrderBy {
                value: other.to_owned(),
            }),
        }
    }
}

/// Validated catalogue search.
///
/// # Examples
/// ```
/// use bookchat::domain::{BookSearchQuery, OrderBy};
///
/// let query = BookSearchQuery::try_new("  dune ", None, None, None).unwrap();
/// assert_eq!(query.query(), "dune");
/// assert_eq!(query.max_results(), 10);
/// assert_eq!(query.order_by(), OrderBy::Relevance);
/// assert!(BookSearchQuery::try_new("dune", Some(41), None, None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSearchQuery {
    query: String,
    max_results: u8,
    order_by: OrderBy,
    start_index: u32,
}

impl BookSearchQuery {
    /// Validate raw search parameters, applying defaults for absent values.
    pub fn try_new(
        query: &str,
        max_results: Option<i64>,
        order_by: Option<&str>,
        start_index: Option<i64>,
    ) -> Result<Self, BookQueryValidationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BookQueryValidationError::EmptyQuery);
        }
        let max_results = match max_results {
            None => DEFAULT_MAX_RESULTS,
            Some(value) => u8::try_from(value)
                .ok()
                .filter(|n| (1..=MAX_RESULTS_LIMIT).contains(n))
                .ok_or(BookQueryValidationError::MaxResultsOutOfRange { value })?,
        };
        let order_by = order_by.map(str::parse).transpose()?.unwrap_or_default();
        let start_index = match start_index {
            None => 0,
            Some(value) => u32::try_from(value)
                .map_err(|_| BookQueryValidationError::NegativeStartIndex { value })?,
        };
        Ok(Self {
            query: query.to_owned(),
            max_results,
            order_by,
            start_index,
        })
    }

    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    pub fn max_results(&self) -> u8 {
        self.max_results
    }

    pub fn order_by(&self) -> OrderBy {
        self.order_by
    }

    pub fn start_index(&self) -> u32 {
        self.start_index
    }
}

/// Summary card for a catalogue volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub ratings_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_link: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSearchPage {
    pub books: Vec<Book>,
    pub total_items: u64,
}

/// ISBN or other industry identifier attached to a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

/// Cover image variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
    pub extra_large: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub amount: f64,
    pub currency_code: String,
}

/// Retail availability of a volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleInfo {
    pub country: Option<String>,
    pub saleability: Option<String>,
    pub is_ebook: bool,
    pub list_price: Option<Price>,
    pub retail_price: Option<Price>,
    pub buy_link: Option<String>,
}

impl SaleInfo {
    /// Whether the volume can be bought right now.
    pub fn is_for_sale(&self) -> bool {
        self.saleability.as_deref() == Some("FOR_SALE")
    }
}

/// Full single-volume view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: String,
    pub isbn: Vec<IndustryIdentifier>,
    pub page_count: u32,
    pub categories: Vec<String>,
    pub average_rating: f64,
    pub ratings_count: u32,
    pub maturity_rating: Option<String>,
    pub language: Option<String>,
    pub image_links: ImageLinks,
    pub preview_link: Option<String>,
    pub info_link: Option<String>,
    pub canonical_volume_link: Option<String>,
    pub sale_info: Option<SaleInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", None, None, None, "query")]
    #[case("   ", None, None, None, "query")]
    #[case("dune", Some(0), None, None, "maxResults")]
    #[case("dune", Some(41), None, None, "maxResults")]
    #[case("dune", Some(-3), None, None, "maxResults")]
    #[case("dune", None, Some("oldest"), None, "orderBy")]
    #[case("dune", None, None, Some(-1), "startIndex")]
    fn rejects_invalid_search_parameters(
        #[case] query: &str,
        #[case] max_results: Option<i64>,
        #[case] order_by: Option<&str>,
        #[case] start_index: Option<i64>,
        #[case] field: &str,
    ) {
        let err = BookSearchQuery::try_new(query, max_results, order_by, start_index)
            .expect_err("invalid search");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn accepts_boundaries() {
        let query = BookSearchQuery::try_new("dune", Some(40), Some("newest"), Some(20))
            .expect("valid search");
        assert_eq!(query.max_results(), 40);
        assert_eq!(query.order_by(), OrderBy::Newest);
        assert_eq!(query.start_index(), 20);
    }

    #[rstest]
    #[case("zyTCAlFPjgYC", true)]
    #[case(" abc-DEF_1 ", true)]
    #[case("", false)]
    #[case("../volumes", false)]
    #[case("a b", false)]
    fn book_id_validation(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(BookId::new(raw).is_ok(), ok);
    }

    #[test]
    fn stored_book_cards_tolerate_missing_fields() {
        let book: Book = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "title": "Dune"
        }))
        .expect("lenient decode");
        assert!(book.authors.is_empty());
        assert_eq!(book.page_count, 0);
    }
}
