//! Reading statistics aggregated from finished reading list entries.
//!
//! The aggregation is a pure function of the entries and "now", so callers
//! inject the clock and tests pin it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::reading_list::ReadingListEntry;

/// Entries kept in the top-genre and top-author rankings.
pub const TOP_RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsValidationError {
    InvalidPeriod { value: String },
    InvalidGroupBy { value: String },
}

impl fmt::Display for StatsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPeriod { value } => write!(
                f,
                "period must be one of all-time, year, month, week (got {value})"
            ),
            Self::InvalidGroupBy { value } => {
                write!(f, "groupBy must be one of genre, author, year (got {value})")
            }
        }
    }
}

impl std::error::Error for StatsValidationError {}

/// Time window for the statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StatsPeriod {
    #[default]
    AllTime,
    Year,
    Month,
    Week,
}

impl StatsPeriod {
    /// Earliest finish time included in the window, or `None` for all time.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::AllTime => None,
            Self::Year => Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0).single(),
            Self::Month => Utc
                .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
                .single(),
            Self::Week => Some(now - Duration::days(7)),
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = StatsValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-time" => Ok(Self::AllTime),
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "week" => Ok(Self::Week),
            other => Err(StatsValidationError::InvalidPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Optional breakdown requested alongside the headline numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Genre,
    Author,
    Year,
}

impl FromStr for GroupBy {
    type Err = StatsValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genre" => Ok(Self::Genre),
            "author" => Ok(Self::Author),
            "year" => Ok(Self::Year),
            other => Err(StatsValidationError::InvalidGroupBy {
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GenreCount {
    pub genre: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorCount {
    pub author: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: u32,
}

/// Aggregated reading statistics.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub total_books: u32,
    pub total_pages: i64,
    pub avg_rating: Option<f64>,
    pub top_genres: Vec<GenreCount>,
    pub top_authors: Vec<AuthorCount>,
    pub books_by_period: Vec<MonthCount>,
    pub current_streak_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<BTreeMap<String, u32>>,
    pub period: StatsPeriod,
}

/// Aggregate statistics for the finished entries inside `period`.
///
/// Unread entries never count. With a bounded period, entries without a
/// finish date are excluded; for all time they count towards January 1970
/// in the monthly breakdown.
pub fn compute_reading_stats(
    entries: &[ReadingListEntry],
    period: StatsPeriod,
    group_by: Option<GroupBy>,
    now: DateTime<Utc>,
) -> ReadingStats {
    let start = period.start(now);
    let finished: Vec<&ReadingListEntry> = entries
        .iter()
        .filter(|entry| entry.is_read)
        .filter(|entry| match (start, entry.date_finished) {
            (None, _) => true,
            (Some(start), Some(done)) => done >= start,
            (Some(_), None) => false,
        })
        .collect();

    let ratings: Vec<f64> = finished
        .iter()
        .filter_map(|entry| entry.user_rating)
        .map(f64::from)
        .collect();
    let avg_rating = (!ratings.is_empty()).then(|| {
        let count = u32::try_from(ratings.len()).map_or(f64::from(u32::MAX), f64::from);
        ratings.iter().sum::<f64>() / count
    });

    let genre_counts = count_names(finished.iter().map(|entry| entry.categories.as_slice()));
    let author_counts = count_names(finished.iter().map(|entry| entry.authors.as_slice()));

    ReadingStats {
        total_books: u32::try_from(finished.len()).unwrap_or(u32::MAX),
        total_pages: finished
            .iter()
            .map(|entry| i64::from(entry.page_count.unwrap_or(0)))
            .sum(),
        avg_rating,
        top_genres: top_ranked(&genre_counts)
            .into_iter()
            .map(|(genre, count)| GenreCount { genre, count })
            .collect(),
        top_authors: top_ranked(&author_counts)
            .into_iter()
            .map(|(author, count)| AuthorCount { author, count })
            .collect(),
        books_by_period: books_by_month(&finished),
        current_streak_days: current_streak_days(&finished, now),
        group_by: group_by.map(|group| match group {
            GroupBy::Genre => genre_counts.into_iter().collect(),
            GroupBy::Author => author_counts.into_iter().collect(),
            GroupBy::Year => {
                let mut years = BTreeMap::new();
                for entry in &finished {
                    let year = entry
                        .date_finished
                        .map_or_else(|| "unknown".to_owned(), |d| d.year().to_string());
                    *years.entry(year).or_insert(0) += 1;
                }
                years
            }
        }),
        period,
    }
}

fn count_names<'a>(lists: impl Iterator<Item = &'a [String]>) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for names in lists {
        let unique: HashSet<&str> = names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        for name in unique {
            *counts.entry(name.to_owned()).or_insert(0) += 1;
        }
    }
    counts
}

fn top_ranked(counts: &HashMap<String, u32>) -> Vec<(String, u32)> {
    let mut ranked: Vec<(String, u32)> = counts
        .iter()
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_RANKING_LIMIT);
    ranked
}

fn books_by_month(finished: &[&ReadingListEntry]) -> Vec<MonthCount> {
    let mut months: BTreeMap<(i32, u32), u32> = BTreeMap::new();
    for entry in finished {
        let key = entry
            .date_finished
            .map_or((1970, 1), |done| (done.year(), done.month()));
        *months.entry(key).or_insert(0) += 1;
    }
    months
        .into_iter()
        .map(|((year, month), count)| MonthCount { year, month, count })
        .collect()
}

fn current_streak_days(finished: &[&ReadingListEntry], now: DateTime<Utc>) -> u32 {
    let days: HashSet<NaiveDate> = finished
        .iter()
        .filter_map(|entry| entry.date_finished)
        .map(|done| done.date_naive())
        .collect();
    let mut streak = 0;
    let mut day = now.date_naive();
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
#[path = "reading_stats_tests.rs"]
mod tests;
