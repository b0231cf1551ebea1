//! Google Books volume payloads and their mapping onto domain types.

use serde::Deserialize;

use crate::domain::{
    Book, BookDetails, BookSearchPage, ImageLinks, IndustryIdentifier, Price, SaleInfo,
};

pub(super) const UNTITLED: &str = "Untitled";
pub(super) const UNKNOWN_AUTHOR: &str = "Unknown author";
pub(super) const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VolumesResponseDto {
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    items: Vec<VolumeDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VolumeDto {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfoDto,
    sale_info: Option<SaleInfoDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfoDto {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Option<Vec<String>>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifierDto>,
    page_count: Option<u32>,
    #[serde(default)]
    categories: Vec<String>,
    average_rating: Option<f64>,
    ratings_count: Option<u32>,
    maturity_rating: Option<String>,
    language: Option<String>,
    #[serde(default)]
    image_links: ImageLinksDto,
    preview_link: Option<String>,
    info_link: Option<String>,
    canonical_volume_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifierDto {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinksDto {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
    extra_large: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceDto {
    amount: f64,
    currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleInfoDto {
    country: Option<String>,
    saleability: Option<String>,
    #[serde(default)]
    is_ebook: bool,
    list_price: Option<PriceDto>,
    retail_price: Option<PriceDto>,
    buy_link: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn price(dto: PriceDto) -> Price {
    Price {
        amount: dto.amount,
        currency_code: dto.currency_code,
    }
}

impl VolumesResponseDto {
    pub(super) fn into_page(self) -> BookSearchPage {
        BookSearchPage {
            books: self.items.into_iter().map(VolumeDto::into_book).collect(),
            total_items: self.total_items,
        }
    }
}

impl VolumeDto {
    /// Summary card with display defaults filled in.
    pub(super) fn into_book(self) -> Book {
        let info = self.volume_info;
        let authors = match info.authors {
            Some(authors) if !authors.is_empty() => authors,
            _ => vec![UNKNOWN_AUTHOR.to_owned()],
        };
        let thumbnail = non_blank(info.image_links.thumbnail)
            .or_else(|| non_blank(info.image_links.small_thumbnail))
            .unwrap_or_default();
        Book {
            id: self.id,
            title: non_blank(info.title).unwrap_or_else(|| UNTITLED.to_owned()),
            authors,
            description: non_blank(info.description).unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
            thumbnail,
            published_date: non_blank(info.published_date),
            publisher: non_blank(info.publisher),
            page_count: info.page_count.unwrap_or(0),
            categories: info.categories,
            average_rating: info.average_rating.unwrap_or(0.0),
            ratings_count: info.ratings_count.unwrap_or(0),
            language: non_blank(info.language),
            preview_link: non_blank(info.preview_link),
            info_link: non_blank(info.info_link),
        }
    }

    /// Full record; absent fields stay absent rather than defaulted.
    pub(super) fn into_details(self) -> BookDetails {
        let info = self.volume_info;
        let links = info.image_links;
        BookDetails {
            id: self.id,
            title: non_blank(info.title).unwrap_or_else(|| UNTITLED.to_owned()),
            subtitle: info.subtitle,
            authors: info.authors.unwrap_or_default(),
            publisher: info.publisher,
            published_date: info.published_date,
            description: info.description.unwrap_or_default(),
            isbn: info
                .industry_identifiers
                .into_iter()
                .map(|id| IndustryIdentifier {
                    kind: id.kind,
                    identifier: id.identifier,
                })
                .collect(),
            page_count: info.page_count.unwrap_or(0),
            categories: info.categories,
            average_rating: info.average_rating.unwrap_or(0.0),
            ratings_count: info.ratings_count.unwrap_or(0),
            maturity_rating: info.maturity_rating,
            language: info.language,
            image_links: ImageLinks {
                small_thumbnail: links.small_thumbnail,
                thumbnail: links.thumbnail,
                small: links.small,
                medium: links.medium,
                large: links.large,
                extra_large: links.extra_large,
            },
            preview_link: info.preview_link,
            info_link: info.info_link,
            canonical_volume_link: info.canonical_volume_link,
            sale_info: self.sale_info.map(|sale| SaleInfo {
                country: sale.country,
                saleability: sale.saleability,
                is_ebook: sale.is_ebook,
                list_price: sale.list_price.map(price),
                retail_price: sale.retail_price.map(price),
                buy_link: sale.buy_link,
            }),
        }
    }
}
