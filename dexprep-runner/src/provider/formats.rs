//! Table file readers: Parquet, CSV and JSON record arrays.

use chrono::{DateTime, Utc};
use dexprep_core::{RawTable, Scalar};
use polars::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::ProviderError;

/// On-disk table format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Csv,
    Json,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "parquet" => Ok(TableFormat::Parquet),
            "csv" => Ok(TableFormat::Csv),
            "json" => Ok(TableFormat::Json),
            _ => Err(ProviderError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Parquet => "parquet",
            TableFormat::Csv => "csv",
            TableFormat::Json => "json",
        }
    }
}

/// Read a table file, picking the reader from the extension.
pub fn read_table_file(path: &Path) -> Result<(RawTable, TableFormat), ProviderError> {
    let format = TableFormat::from_path(path)?;
    let table = match format {
        TableFormat::Parquet => read_parquet(path)?,
        TableFormat::Csv => read_csv(path)?,
        TableFormat::Json => read_json(path)?,
    };
    Ok((table, format))
}

// ── Parquet ──────────────────────────────────────────────────────────

fn read_parquet(path: &Path) -> Result<RawTable, ProviderError> {
    let parquet_err = |reason: String| ProviderError::Parquet {
        path: path.to_path_buf(),
        reason,
    };

    let file = fs::File::open(path).map_err(|source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| parquet_err(format!("read: {e}")))?;

    let columns = df.get_columns();
    let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let mut table = RawTable::new(names).map_err(|source| ProviderError::Table {
        path: path.to_path_buf(),
        source,
    })?;

    for i in 0..df.height() {
        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            let value = column
                .get(i)
                .map_err(|e| parquet_err(format!("column '{}' row {i}: {e}", column.name())))?;
            row.push(scalar_from_any(value));
        }
        table.push_row(row).map_err(|source| ProviderError::Table {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(table)
}

fn scalar_from_any(value: AnyValue<'_>) -> Scalar {
    match value {
        AnyValue::Null => Scalar::Null,
        AnyValue::Boolean(b) => Scalar::Bool(b),
        AnyValue::String(s) => Scalar::Str(s.to_string()),
        AnyValue::StringOwned(s) => Scalar::Str(s.to_string()),
        AnyValue::Int32(v) => Scalar::Int(i64::from(v)),
        AnyValue::Int64(v) => Scalar::Int(v),
        AnyValue::UInt32(v) => Scalar::Int(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(v as f64)),
        AnyValue::Float32(v) => Scalar::Float(f64::from(v)),
        AnyValue::Float64(v) => Scalar::Float(v),
        AnyValue::Date(days) => DateTime::<Utc>::from_timestamp(i64::from(days) * 86_400, 0)
            .map(Scalar::Timestamp)
            .unwrap_or(Scalar::Null),
        AnyValue::Datetime(v, unit, _) => {
            let at = match unit {
                TimeUnit::Nanoseconds => Some(DateTime::<Utc>::from_timestamp_nanos(v)),
                TimeUnit::Microseconds => DateTime::<Utc>::from_timestamp_micros(v),
                TimeUnit::Milliseconds => DateTime::<Utc>::from_timestamp_millis(v),
            };
            at.map(Scalar::Timestamp).unwrap_or(Scalar::Null)
        }
        other => Scalar::Str(other.to_string()),
    }
}

// ── CSV ──────────────────────────────────────────────────────────────

/// Inferred type of a CSV column. A column is integer only if every
/// non-empty field parses as one, likewise for float; otherwise text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsvKind {
    Int,
    Float,
    Text,
}

fn read_csv(path: &Path) -> Result<RawTable, ProviderError> {
    let csv_err = |source: csv::Error| ProviderError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records: Vec<csv::StringRecord> = Vec::new();
    for record in reader.records() {
        records.push(record.map_err(csv_err)?);
    }

    let kinds: Vec<CsvKind> = (0..headers.len())
        .map(|c| infer_kind(records.iter().filter_map(|r| r.get(c))))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            kinds
                .iter()
                .enumerate()
                .map(|(c, kind)| csv_scalar(record.get(c).unwrap_or_default(), *kind))
                .collect()
        })
        .collect();

    RawTable::from_rows(headers, rows).map_err(|source| ProviderError::Table {
        path: path.to_path_buf(),
        source,
    })
}

fn infer_kind<'a>(fields: impl Iterator<Item = &'a str>) -> CsvKind {
    let mut kind = CsvKind::Int;
    for field in fields.filter(|f| !f.is_empty()) {
        if kind == CsvKind::Int && field.parse::<i64>().is_err() {
            kind = CsvKind::Float;
        }
        if kind == CsvKind::Float && !field.parse::<f64>().is_ok_and(f64::is_finite) {
            return CsvKind::Text;
        }
    }
    kind
}

fn csv_scalar(field: &str, kind: CsvKind) -> Scalar {
    if field.is_empty() {
        return Scalar::Null;
    }
    match kind {
        CsvKind::Int => field.parse().map(Scalar::Int).unwrap_or(Scalar::Null),
        CsvKind::Float => field.parse().map(Scalar::Float).unwrap_or(Scalar::Null),
        CsvKind::Text => Scalar::Str(field.to_string()),
    }
}

// ── JSON ─────────────────────────────────────────────────────────────

fn read_json(path: &Path) -> Result<RawTable, ProviderError> {
    let content = fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ProviderError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(records) = value else {
        return Err(ProviderError::NotRecords {
            path: path.to_path_buf(),
        });
    };
    RawTable::from_json_records(&records).map_err(|source| ProviderError::Table {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a/b.parquet")).unwrap(), TableFormat::Parquet);
        assert_eq!(TableFormat::from_path(Path::new("b.CSV")).unwrap(), TableFormat::Csv);
        assert!(matches!(
            TableFormat::from_path(Path::new("b.xlsx")),
            Err(ProviderError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_csv_infers_column_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "prices.csv",
            "date,symbol,close,volume,code\n\
             2024-01-02,SPY,470.5,100,001\n\
             2024-01-03,SPY,,200,A1\n\
             2024-01-04,SPY,472,,002\n",
        );

        let (table, format) = read_table_file(&path).unwrap();
        assert_eq!(format, TableFormat::Csv);
        assert_eq!(table.columns(), ["date", "symbol", "close", "volume", "code"]);
        assert_eq!(table.len(), 3);

        let first = table.row(0).unwrap();
        assert_eq!(first[0], Scalar::from("2024-01-02"));
        assert_eq!(first[2], Scalar::Float(470.5));
        assert_eq!(first[3], Scalar::Int(100));
        assert_eq!(first[4], Scalar::from("001"));

        let second = table.row(1).unwrap();
        assert_eq!(second[2], Scalar::Null);

        let third = table.row(2).unwrap();
        assert_eq!(third[2], Scalar::Float(472.0));
        assert_eq!(third[3], Scalar::Null);
    }

    #[test]
    fn test_csv_compact_dates_normalize() {
        use dexprep_core::{normalize, Category, MacroSource, Metadata, NormalizeContext, Stats};

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "fred_rates.csv",
            "series_id,date,value\n\
             DGS10,20240102,4.0\n\
             DGS10,20240103,NaN\n\
             DGS10,20240104,4.2\n",
        );

        let (table, _) = read_table_file(&path).unwrap();
        assert_eq!(table.row(0).unwrap()[1], Scalar::Int(20240102));

        let ctx = NormalizeContext::new(chrono::Utc::now());
        let doc = normalize(
            "fred_rates",
            Category::MacroSeries(MacroSource::Fred),
            &table,
            &Metadata::new(),
            &ctx,
        )
        .unwrap();
        let Stats::Series { by_series, .. } = &doc.stats else {
            panic!("expected series stats");
        };
        let dgs10 = by_series.get("DGS10").unwrap();
        assert_eq!(dgs10.count, 3);
        assert_eq!(dgs10.date_max, "2024-01-04T00:00:00+00:00");
        assert_eq!(dgs10.value_mean, Some(4.1));
        assert_eq!(dgs10.value_latest, Some(4.2));
    }

    #[test]
    fn test_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "news.json",
            r#"[{"title": "a", "published": "2024-01-01T00:00:00Z"}, {"title": "b", "author": "x"}]"#,
        );

        let (table, _) = read_table_file(&path).unwrap();
        assert_eq!(table.columns(), ["title", "published", "author"]);
        assert_eq!(table.row(1).unwrap()[1], Scalar::Null);
    }

    #[test]
    fn test_json_must_be_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.json", r#"{"title": "a"}"#);
        assert!(matches!(
            read_table_file(&path),
            Err(ProviderError::NotRecords { .. })
        ));
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.parquet");

        let mut df = df!(
            "series_id" => ["DGS10", "DGS10"],
            "date" => ["2024-01-01", "2024-01-02"],
            "value" => [Some(4.05), None],
            "count" => [1i64, 2],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        ParquetWriter::new(file).finish(&mut df).unwrap();

        let (table, format) = read_table_file(&path).unwrap();
        assert_eq!(format, TableFormat::Parquet);
        assert_eq!(table.columns(), ["series_id", "date", "value", "count"]);
        assert_eq!(
            table.row(0).unwrap(),
            [
                Scalar::from("DGS10"),
                Scalar::from("2024-01-01"),
                Scalar::Float(4.05),
                Scalar::Int(1),
            ]
        );
        assert_eq!(table.row(1).unwrap()[2], Scalar::Null);
    }
}
