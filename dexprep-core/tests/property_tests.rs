//! Property-based tests for the normalizers.
//!
//! Checks invariants that must hold for arbitrary tables:
//! - Price: the per-symbol key set equals the sorted distinct symbols, and
//!   counts add up to the published rows
//! - Price: `data` is ordered by symbol then date
//! - News: `data` holds min(30, usable rows), newest first
//! - Rounding: every statistic has at most four decimals

use chrono::{Duration, TimeZone, Utc};
use dexprep_core::{
    normalize, Category, MacroSource, Metadata, NormalizeContext, RawTable, Scalar, Stats,
};
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

const SYMBOLS: [&str; 5] = ["AAA", "BBB", "CCC", "SPY", "QQQ"];

fn ctx() -> NormalizeContext {
    NormalizeContext::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

fn day(offset: i64) -> String {
    (Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string()
}

/// (symbol index, day offset, close, volume)
fn arb_price_rows() -> impl Strategy<Value = Vec<(usize, i64, f64, i64)>> {
    prop::collection::vec(
        (0..SYMBOLS.len(), 0i64..90, 1.0f64..500.0, 0i64..1_000_000),
        0..60,
    )
}

fn price_table(rows: &[(usize, i64, f64, i64)]) -> RawTable {
    RawTable::from_rows(
        ["date", "symbol", "close", "volume"],
        rows.iter()
            .map(|&(s, d, close, volume)| {
                vec![
                    Scalar::Str(day(d)),
                    Scalar::from(SYMBOLS[s]),
                    Scalar::Float(close),
                    Scalar::Int(volume),
                ]
            })
            .collect(),
    )
    .unwrap()
}

fn has_at_most_four_decimals(x: f64) -> bool {
    let scaled = x * 10_000.0;
    (scaled - scaled.round()).abs() < 1e-6
}

// ── Price ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn price_keys_are_sorted_distinct_symbols(rows in arb_price_rows()) {
        let doc = normalize("px", Category::PriceSeries, &price_table(&rows), &Metadata::new(), &ctx())
            .unwrap();
        let Stats::Price { by_symbol, .. } = &doc.stats else {
            panic!("expected price stats");
        };

        let mut expected: Vec<&str> = rows.iter().map(|r| SYMBOLS[r.0]).collect();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(by_symbol.keys().collect::<Vec<_>>(), expected);

        let total: usize = by_symbol.iter().map(|(_, s)| s.count).sum();
        prop_assert_eq!(total, rows.len());
        prop_assert_eq!(doc.data.len(), rows.len());
    }

    #[test]
    fn price_data_is_ordered_by_symbol_then_date(rows in arb_price_rows()) {
        let doc = normalize("px", Category::PriceSeries, &price_table(&rows), &Metadata::new(), &ctx())
            .unwrap();
        let keys: Vec<(String, String)> = doc
            .data
            .iter()
            .map(|r| (r.get("symbol").unwrap().key_string(), r.get("date").unwrap().key_string()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn price_stats_are_rounded_and_bounded(rows in arb_price_rows()) {
        let doc = normalize("px", Category::PriceSeries, &price_table(&rows), &Metadata::new(), &ctx())
            .unwrap();
        let Stats::Price { by_symbol, .. } = &doc.stats else {
            panic!("expected price stats");
        };
        for (_, stats) in by_symbol.iter() {
            let (min, mean, max) = (
                stats.close_min.unwrap(),
                stats.close_mean.unwrap(),
                stats.close_max.unwrap(),
            );
            prop_assert!(min <= mean && mean <= max);
            prop_assert!(stats.close_std.unwrap() >= 0.0);
            for x in [min, mean, max, stats.close_std.unwrap()] {
                prop_assert!(has_at_most_four_decimals(x), "{} has too many decimals", x);
            }
            prop_assert!(stats.date_min <= stats.date_max);
        }
    }
}

// ── Macro ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn series_latest_is_value_at_max_date(offsets in prop::collection::hash_set(0i64..365, 1..30)) {
        let offsets: Vec<i64> = offsets.into_iter().collect();
        let rows = offsets
            .iter()
            .map(|&d| vec![Scalar::from("GDP"), Scalar::Str(day(d)), Scalar::Int(d)])
            .collect();
        let table = RawTable::from_rows(["series_id", "date", "value"], rows).unwrap();
        let doc = normalize(
            "fred_gdp",
            Category::MacroSeries(MacroSource::Fred),
            &table,
            &Metadata::new(),
            &ctx(),
        )
        .unwrap();
        let Stats::Series { by_series, .. } = &doc.stats else {
            panic!("expected series stats");
        };

        let latest = *offsets.iter().max().unwrap() as f64;
        prop_assert_eq!(by_series.get("GDP").unwrap().value_latest, Some(latest));
    }
}

// ── News ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn news_data_is_capped_and_newest_first(
        hours in prop::collection::vec(0i64..2_000, 0..80),
        garbage in 0usize..10,
    ) {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut rows: Vec<Vec<Scalar>> = hours
            .iter()
            .map(|&h| vec![
                Scalar::from("t"),
                Scalar::Str((base + Duration::hours(h)).to_rfc3339()),
                Scalar::from("feed"),
            ])
            .collect();
        rows.extend((0..garbage).map(|_| vec![
            Scalar::from("t"),
            Scalar::from("not a date"),
            Scalar::from("feed"),
        ]));
        let table = RawTable::from_rows(["title", "published", "feed_name"], rows).unwrap();

        let doc = normalize("news", Category::NewsFeed, &table, &Metadata::new(), &ctx()).unwrap();
        prop_assert_eq!(doc.data.len(), hours.len().min(30));

        let published: Vec<String> = doc
            .data
            .iter()
            .map(|r| r.get("published").unwrap().key_string())
            .collect();
        prop_assert!(published.windows(2).all(|w| w[0] >= w[1]));

        let Stats::News { articles_by_feed, articles_by_day, .. } = &doc.stats else {
            panic!("expected news stats");
        };
        let by_feed: usize = articles_by_feed.iter().map(|(_, n)| *n).sum();
        let by_day: usize = articles_by_day.values().sum();
        prop_assert_eq!(by_feed, hours.len());
        prop_assert_eq!(by_day, hours.len());
    }
}
