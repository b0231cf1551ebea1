//! Tool definitions advertised to the model and the payloads fed back to it.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::ports::ToolDefinition;
use crate::domain::{Book, BookDetails, BookSearchPage};

pub const SEARCH_BOOKS: &str = "searchBooks";
pub const GET_BOOK_DETAILS: &str = "getBookDetails";

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Tools offered on every completion request.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SEARCH_BOOKS.to_owned(),
            description: "Search the book catalogue by title, author, topic, or keywords. \
                Use it when the reader wants recommendations, books by an author, or \
                books on a subject."
                .to_owned(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search terms: title, author, topic, or keywords"
                    },
                    "maxResults": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 40,
                        "description": "Maximum number of results (default 10)"
                    },
                    "orderBy": {
                        "type": "string",
                        "enum": ["relevance", "newest"],
                        "description": "Result ordering"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: GET_BOOK_DETAILS.to_owned(),
            description: "Fetch the full record of one book by its bookId from earlier \
                search results. Use it when the reader asks for more about a specific \
                book, e.g. \"the second one\", its page count, ISBN, or price."
                .to_owned(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "bookId": {
                        "type": "string",
                        "description": "Catalogue id taken from searchBooks results"
                    }
                },
                "required": ["bookId"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchBooksArgs {
    pub query: String,
    pub max_results: Option<i64>,
    pub order_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GetBookDetailsArgs {
    pub book_id: String,
}

/// Parse raw tool arguments; models sometimes send an empty string for "{}".
pub(super) fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

pub(super) fn error_payload(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

fn preview(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let head: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        description.to_owned()
    }
}

fn rating_label(book: &Book) -> String {
    if book.average_rating > 0.0 {
        format!("{}/5 ({} reviews)", book.average_rating, book.ratings_count)
    } else {
        "No rating".to_owned()
    }
}

/// Compact search summary for the model.
pub(super) fn search_payload(query: &str, page: &BookSearchPage) -> Value {
    let books: Vec<Value> = page
        .books
        .iter()
        .enumerate()
        .map(|(index, book)| {
            json!({
                "position": index + 1,
                "bookId": book.id,
                "title": book.title,
                "authors": book.authors.join(", "),
                "description": preview(&book.description),
                "publishedDate": book.published_date,
                "pageCount": book.page_count,
                "categories": book.categories.join(", "),
                "rating": rating_label(book),
            })
        })
        .collect();
    json!({
        "success": true,
        "query": query,
        "totalFound": page.total_items,
        "books": books,
        "instruction": "When the reader refers to a book by position (\"the first\", \
            \"the second\"), call getBookDetails with that book's bookId."
    })
}

/// Detail summary for the model.
pub(super) fn details_payload(book: &BookDetails) -> Value {
    let sale = book.sale_info.as_ref().map(|sale| {
        json!({
            "available": sale.is_for_sale(),
            "isEbook": sale.is_ebook,
            "price": sale.list_price,
            "buyLink": sale.buy_link,
        })
    });
    json!({
        "success": true,
        "book": {
            "id": book.id,
            "title": book.title,
            "subtitle": book.subtitle,
            "authors": book.authors,
            "publisher": book.publisher,
            "publishedDate": book.published_date,
            "description": book.description,
            "pageCount": book.page_count,
            "categories": book.categories,
            "language": book.language,
            "isbn": book.isbn,
            "rating": {
                "average": book.average_rating,
                "count": book.ratings_count,
                "maturity": book.maturity_rating,
            },
            "links": {
                "preview": book.preview_link,
                "info": book.info_link,
                "canonical": book.canonical_volume_link,
            },
            "saleInfo": sale,
        }
    })
}
