//! RSS news feeds: article counts per `feed_name` and per day, plus the most
//! recent articles.
//!
//! Rows whose `published` value cannot be parsed are dropped before any
//! counting. A table without `published` keeps every row, has no date range
//! and publishes its first rows in table order.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::document::{CanonicalDocument, DateRange, KeyedMap, Stats};
use crate::table::Scalar;
use crate::temporal;

use super::descriptor::DataOrder;
use super::{date_range, sorted_unique, to_json_list, Input, NormalizeError};

struct Article {
    index: usize,
    feed: Scalar,
    at: Option<DateTime<Utc>>,
}

pub(super) fn build(input: &Input<'_>) -> Result<CanonicalDocument, NormalizeError> {
    if input.table.is_empty() {
        return Ok(empty(input));
    }

    let feed = input.column(input.descriptor.key_column());
    let mut articles: Vec<Article> = match input.column(input.descriptor.date_column) {
        Some(date) => input
            .dated_rows(feed, date)?
            .into_iter()
            .map(|r| Article {
                index: r.index,
                feed: r.key,
                at: Some(r.at),
            })
            .collect(),
        None => input
            .table
            .rows()
            .enumerate()
            .map(|(index, cells)| Article {
                index,
                feed: feed.map(|f| cells[f].clone()).unwrap_or(Scalar::Null),
                at: None,
            })
            .collect(),
    };

    let feeds = sorted_unique(articles.iter().map(|a| &a.feed));
    let mut feed_counts: HashMap<String, usize> = HashMap::new();
    for article in articles.iter().filter(|a| !a.feed.is_null()) {
        *feed_counts.entry(article.feed.key_string()).or_default() += 1;
    }
    let mut articles_by_feed = KeyedMap::new();
    for name in &feeds {
        let key = name.key_string();
        let count = feed_counts.get(&key).copied().unwrap_or_default();
        articles_by_feed.insert(key, count);
    }

    let mut articles_by_day: BTreeMap<String, usize> = BTreeMap::new();
    for at in articles.iter().filter_map(|a| a.at.as_ref()) {
        *articles_by_day.entry(temporal::day(at)).or_default() += 1;
    }

    let range = date_range(articles.iter().filter_map(|a| a.at.as_ref()));
    let record_count = articles.len();

    // Newest first; the stable sort keeps table order among equal timestamps.
    articles.sort_by(|a, b| b.at.cmp(&a.at));
    let limit = match input.descriptor.order {
        DataOrder::NewestFirst { limit } => limit,
        _ => articles.len(),
    };

    let picks = input.projection();
    let data = articles
        .iter()
        .take(limit)
        .map(|a| input.project(&picks, a.index, a.at.as_ref(), temporal::minute))
        .collect();

    let stats = Stats::News {
        date_range: range,
        articles_by_feed,
        articles_by_day,
    };
    Ok(input.document(
        record_count,
        stats,
        data,
        vec![("feeds", to_json_list(&feeds))],
    ))
}

fn empty(input: &Input<'_>) -> CanonicalDocument {
    let stats = Stats::News {
        date_range: DateRange::empty(),
        articles_by_feed: KeyedMap::new(),
        articles_by_day: BTreeMap::new(),
    };
    input.document(0, stats, Vec::new(), vec![("feeds", to_json_list(&[]))])
}
