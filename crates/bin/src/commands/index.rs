//! `getrss`: index a range of monthly feeds.

use super::progress_bar;
use edgar_rss::{IndexSummary, MergeMode, PeriodRange, PeriodReport, SecIndexer};

pub(crate) async fn get_rss(
    indexer: &SecIndexer,
    from_year: i32,
    to_year: i32,
    from_month: i32,
    to_month: i32,
    replace: bool,
) -> edgar_rss::Result<()> {
    let range = PeriodRange::new(from_year, to_year, from_month, to_month);
    let mode = if replace {
        MergeMode::Replace
    } else {
        MergeMode::Upsert
    };

    println!("Indexing EDGAR XBRL feeds {} to {}", range.first(), range.last());

    let pb = progress_bar(range.len() as u64);
    pb.set_message("Fetching feeds...");
    let summary = indexer
        .download_sec_feeds_with(range, mode, |report| {
            pb.set_message(report.period().to_string());
            pb.inc(1);
        })
        .await?;
    pb.finish_and_clear();

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &IndexSummary) {
    let indexed = summary.reports.len() - summary.skipped().count();
    println!();
    println!("  Months indexed:   {}", indexed);
    println!("  Records parsed:   {}", summary.merge.received);
    println!("  Duplicates:       {}", summary.merge.duplicates);
    println!("  Rows written:     {}", summary.merge.written);
    println!("  Rows in table:    {}", summary.merge.table_rows);

    let warnings: usize = summary
        .reports
        .iter()
        .map(|r| match r {
            PeriodReport::Indexed { warnings, .. } => *warnings,
            PeriodReport::Skipped { .. } => 0,
        })
        .sum();
    if warnings > 0 {
        println!("  Parser warnings:  {}", warnings);
    }

    for report in summary.skipped() {
        if let PeriodReport::Skipped { period, reason } = report {
            println!("  Skipped {}: {}", period, reason);
        }
    }
}
