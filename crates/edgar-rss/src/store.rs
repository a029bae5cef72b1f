//! SQLite storage for filing metadata.
//!
//! Filings live in a single `feeds` table keyed by accession number. The
//! table is always created with an explicit `CREATE TABLE` statement so the
//! primary key is declared before any rows are written; repeated indexing
//! runs over the same months therefore never grow the table.

use crate::error::{EdgarError, Result};
use crate::record::{FeedField, FilingRecord};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Name of the filing metadata table.
pub const FEEDS_TABLE: &str = "feeds";

/// Date formats accepted for `filing_date`, tried in order.
const FILING_DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%Y%m%d"];

/// How a merge treats rows already in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    /// Insert new accession numbers and overwrite existing ones; rows from
    /// earlier merges are kept.
    #[default]
    Upsert,
    /// Delete every row, then insert the batch. Only the months passed to
    /// this merge remain in the table.
    Replace,
}

/// Outcome of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Records passed in, across all record sets
    pub received: usize,
    /// Records dropped because their accession number repeated within the batch
    pub duplicates: usize,
    /// Rows inserted or updated
    pub written: usize,
    /// Rows in the table after the merge
    pub table_rows: usize,
}

/// Form type filter for queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormFilter {
    /// Any form type
    #[default]
    All,
    /// Exactly this form type (e.g., "10-K")
    Exact(String),
}

impl FromStr for FormFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Exact(s.to_string()))
        }
    }
}

/// Filings of one filer over a span of calendar years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingQuery {
    /// Filer CIK, with or without zero padding
    pub cik: String,
    /// First calendar year (from January 1st)
    pub from_year: i32,
    /// Last calendar year (through December 31st)
    pub to_year: i32,
    /// Form type filter
    pub form: FormFilter,
}

impl FilingQuery {
    /// Query for all forms filed by `cik` in `from_year..=to_year`.
    pub fn new(cik: impl Into<String>, from_year: i32, to_year: i32) -> Self {
        Self {
            cik: cik.into(),
            from_year,
            to_year,
            form: FormFilter::All,
        }
    }

    /// Restrict the query to one form type.
    pub fn with_form(mut self, form: FormFilter) -> Self {
        self.form = form;
        self
    }

    /// Inclusive date bounds of the query.
    pub fn date_bounds(&self) -> Result<(NaiveDate, NaiveDate)> {
        let from = NaiveDate::from_ymd_opt(self.from_year, 1, 1)
            .ok_or_else(|| EdgarError::Parse(format!("Invalid year: {}", self.from_year)))?;
        let to = NaiveDate::from_ymd_opt(self.to_year, 12, 31)
            .ok_or_else(|| EdgarError::Parse(format!("Invalid year: {}", self.to_year)))?;
        Ok((from, to))
    }
}

/// Parse a filing date as published in the feeds (`MM/DD/YYYY`) or in ISO form.
pub fn parse_filing_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    FILING_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// SQLite store for filing metadata.
#[derive(Debug)]
pub struct FeedStore {
    conn: Connection,
}

impl FeedStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the `feeds` table if it does not exist.
    pub fn ensure_schema(&self) -> Result<()> {
        let columns = FeedField::ALL
            .iter()
            .map(|f| match f {
                FeedField::AccessionNumber => format!("{} TEXT PRIMARY KEY", f.column()),
                _ => format!("{} TEXT", f.column()),
            })
            .collect::<Vec<_>>()
            .join(", ");

        self.conn.execute(
            &format!("CREATE TABLE IF NOT EXISTS {FEEDS_TABLE} ({columns})"),
            [],
        )?;

        self.conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_feeds_cik ON {FEEDS_TABLE}(cik_number)"),
            [],
        )?;

        Ok(())
    }

    /// Merge parsed record sets into the table.
    ///
    /// All sets are flattened into one batch. Repeated accession numbers
    /// within the batch are dropped, keeping the first occurrence. The batch
    /// is then written in a single transaction according to `mode`.
    pub fn merge<I, S>(&self, record_sets: I, mode: MergeMode) -> Result<MergeSummary>
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = FilingRecord>,
    {
        let mut summary = MergeSummary::default();
        let mut seen = HashSet::new();
        let mut batch = Vec::new();

        for record in record_sets.into_iter().flatten() {
            summary.received += 1;
            if seen.insert(record.accession_number.clone()) {
                batch.push(record);
            } else {
                summary.duplicates += 1;
            }
        }

        if summary.duplicates > 0 {
            info!(dropped = summary.duplicates, "Dropped duplicate accession numbers");
        }

        let tx = self.conn.unchecked_transaction()?;

        if mode == MergeMode::Replace {
            let removed = tx.execute(&format!("DELETE FROM {FEEDS_TABLE}"), [])?;
            debug!(removed, "Cleared feeds table");
        }

        {
            let mut stmt = tx.prepare(&upsert_sql())?;
            for record in &batch {
                stmt.execute(params_from_iter(FeedField::ALL.map(|f| record.get(f))))?;
                summary.written += 1;
            }
        }

        tx.commit()?;

        summary.table_rows = self.count()?;
        info!(
            written = summary.written,
            rows = summary.table_rows,
            "Saved feed details"
        );

        Ok(summary)
    }

    /// Number of rows in the table.
    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {FEEDS_TABLE}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }

    /// Look up a single filing by accession number.
    pub fn get(&self, accession_number: &str) -> Result<Option<FilingRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {FEEDS_TABLE} WHERE accession_number = ?1",
                    column_list()
                ),
                params![accession_number],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Filings matching `query`, ordered by filing date then accession number.
    ///
    /// The CIK is compared without leading zeros. Filings whose date cannot
    /// be parsed never match.
    pub fn find(&self, query: &FilingQuery) -> Result<Vec<FilingRecord>> {
        let (from, to) = query.date_bounds()?;

        let mut sql = format!(
            "SELECT {} FROM {FEEDS_TABLE} WHERE ltrim(cik_number, '0') = ltrim(?1, '0')",
            column_list()
        );
        let mut args = vec![query.cik.trim().to_string()];
        if let FormFilter::Exact(form) = &query.form {
            sql.push_str(" AND form_type = ?2");
            args.push(form.clone());
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut matches: Vec<(NaiveDate, FilingRecord)> = rows
            .into_iter()
            .filter_map(|record| {
                let date = record.filing_date.as_deref().and_then(parse_filing_date);
                if date.is_none() {
                    debug!(
                        accession = %record.accession_number,
                        "Ignoring filing with unparsable date"
                    );
                }
                date.map(|d| (d, record))
            })
            .filter(|(date, _)| *date >= from && *date <= to)
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.accession_number.cmp(&b.1.accession_number))
        });

        debug!(cik = %query.cik, found = matches.len(), "Queried filings");
        Ok(matches.into_iter().map(|(_, record)| record).collect())
    }

    /// Instance document URLs of the filings matching `query`. Filings
    /// without an instance document are left out.
    pub fn query(&self, query: &FilingQuery) -> Result<Vec<String>> {
        Ok(self
            .find(query)?
            .into_iter()
            .filter_map(|record| record.xbrl_files)
            .collect())
    }
}

fn column_list() -> String {
    FeedField::ALL
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ")
}

fn upsert_sql() -> String {
    let placeholders = (1..=FeedField::ALL.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = FeedField::ALL
        .iter()
        .filter(|f| **f != FeedField::AccessionNumber)
        .map(|f| format!("{0} = excluded.{0}", f.column()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {FEEDS_TABLE} ({}) VALUES ({placeholders})
         ON CONFLICT(accession_number) DO UPDATE SET {updates}",
        column_list()
    )
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FilingRecord> {
    let mut record = FilingRecord::default();
    for (i, field) in FeedField::ALL.into_iter().enumerate() {
        record.set(field, row.get::<_, Option<String>>(i)?);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(accession: &str, cik: &str, form: &str, date: &str) -> FilingRecord {
        FilingRecord {
            company_name: Some("EXAMPLE CORP".to_string()),
            form_type: Some(form.to_string()),
            filing_date: Some(date.to_string()),
            cik_number: Some(cik.to_string()),
            accession_number: accession.to_string(),
            xbrl_files: Some(format!("https://www.sec.gov/Archives/{accession}.xml")),
            ..Default::default()
        }
    }

    #[test]
    fn test_schema_declares_primary_key() {
        let store = FeedStore::in_memory().unwrap();
        // Idempotent
        store.ensure_schema().unwrap();

        let mut stmt = store
            .conn
            .prepare("SELECT name, pk FROM pragma_table_info('feeds') ORDER BY cid")
            .unwrap();
        let columns: Vec<(String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        let names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        let expected: Vec<&str> = FeedField::ALL.iter().map(|f| f.column()).collect();
        assert_eq!(names, expected);

        let keys: Vec<&str> = columns
            .iter()
            .filter(|(_, pk)| *pk > 0)
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(keys, vec!["accession_number"]);
    }

    #[test]
    fn test_merge_drops_duplicates_within_batch() {
        let store = FeedStore::in_memory().unwrap();
        let first = vec![
            record("A", "1", "10-K", "01/05/2016"),
            record("B", "1", "10-Q", "02/05/2016"),
        ];
        let second = vec![
            record("B", "1", "10-Q", "02/05/2016"),
            record("C", "1", "10-Q", "03/05/2016"),
        ];

        let summary = store.merge([first, second], MergeMode::Upsert).unwrap();
        assert_eq!(summary.received, 4);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.table_rows, 3);
    }

    #[test]
    fn test_upsert_keeps_history_and_never_grows() {
        let store = FeedStore::in_memory().unwrap();
        store
            .merge([vec![record("A", "1", "10-K", "01/05/2016")]], MergeMode::Upsert)
            .unwrap();

        let mut updated = record("A", "1", "10-K/A", "01/05/2016");
        updated.company_name = Some("RENAMED CORP".to_string());
        let summary = store
            .merge(
                [vec![updated, record("B", "1", "10-Q", "04/05/2016")]],
                MergeMode::Upsert,
            )
            .unwrap();

        assert_eq!(summary.table_rows, 2);
        let a = store.get("A").unwrap().unwrap();
        assert_eq!(a.company_name.as_deref(), Some("RENAMED CORP"));
        assert_eq!(a.form_type.as_deref(), Some("10-K/A"));
    }

    #[test]
    fn test_replace_discards_previous_rows() {
        let store = FeedStore::in_memory().unwrap();
        store
            .merge([vec![record("A", "1", "10-K", "01/05/2016")]], MergeMode::Upsert)
            .unwrap();
        let summary = store
            .merge([vec![record("B", "1", "10-K", "01/05/2017")]], MergeMode::Replace)
            .unwrap();

        assert_eq!(summary.table_rows, 1);
        assert!(store.get("A").unwrap().is_none());
        assert!(store.get("B").unwrap().is_some());
    }

    #[test]
    fn test_query_by_year_range() {
        let store = FeedStore::in_memory().unwrap();
        store
            .merge(
                [vec![
                    record("OLD", "0000050863", "10-K", "12/31/2015"),
                    record("MID", "0000050863", "10-K", "06/15/2016"),
                    record("NEW", "0000050863", "10-K", "01/01/2017"),
                ]],
                MergeMode::Upsert,
            )
            .unwrap();

        let found = store.find(&FilingQuery::new("0000050863", 2016, 2016)).unwrap();
        let accessions: Vec<_> = found.iter().map(|r| r.accession_number.as_str()).collect();
        assert_eq!(accessions, vec!["MID"]);

        let urls = store.query(&FilingQuery::new("50863", 2016, 2016)).unwrap();
        assert_eq!(urls, vec!["https://www.sec.gov/Archives/MID.xml".to_string()]);
    }

    #[test]
    fn test_query_form_filter_and_missing_url() {
        let store = FeedStore::in_memory().unwrap();
        let mut no_url = record("C", "42", "10-K", "09/01/2016");
        no_url.xbrl_files = None;
        store
            .merge(
                [vec![
                    record("A", "42", "10-K", "03/01/2016"),
                    record("B", "42", "10-Q", "05/01/2016"),
                    no_url,
                    record("D", "43", "10-K", "03/01/2016"),
                ]],
                MergeMode::Upsert,
            )
            .unwrap();

        let all = FilingQuery::new("42", 2016, 2016);
        assert_eq!(store.find(&all).unwrap().len(), 3);
        assert_eq!(store.query(&all).unwrap().len(), 2);

        let ten_k = all.with_form("10-K".parse().unwrap());
        let urls = store.query(&ten_k).unwrap();
        assert_eq!(urls, vec!["https://www.sec.gov/Archives/A.xml".to_string()]);
    }

    #[test]
    fn test_form_filter_parse() {
        assert_eq!("All".parse::<FormFilter>().unwrap(), FormFilter::All);
        assert_eq!("all".parse::<FormFilter>().unwrap(), FormFilter::All);
        assert_eq!(
            "10-Q".parse::<FormFilter>().unwrap(),
            FormFilter::Exact("10-Q".to_string())
        );
    }

    #[test]
    fn test_parse_filing_date() {
        assert_eq!(
            parse_filing_date("12/30/2016"),
            NaiveDate::from_ymd_opt(2016, 12, 30)
        );
        assert_eq!(
            parse_filing_date("2016-12-30"),
            NaiveDate::from_ymd_opt(2016, 12, 30)
        );
        assert_eq!(parse_filing_date("not a date"), None);
    }
}
