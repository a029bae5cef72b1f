//! `getxbrl` and `list`: work with the filings of selected filers.

use super::{Filers, cik_resolver, progress_bar};
use edgar_rss::download::filing_filename;
use edgar_rss::lookup::read_ticker_file;
use edgar_rss::{EdgarError, FilingQuery, FilingRecord, FormFilter, SecIndexer};
use tracing::warn;

pub(crate) async fn get_xbrl(
    indexer: &SecIndexer,
    filers: Filers,
    from_year: i32,
    to_year: i32,
    form: FormFilter,
) -> edgar_rss::Result<()> {
    match filers {
        Filers::Cik(cik) => {
            download_filer(indexer, &cik, from_year, to_year, &form).await?;
        }
        Filers::Ticker(ticker) => {
            let cik = cik_resolver(indexer)?.resolve(&ticker).await?;
            download_filer(indexer, &cik, from_year, to_year, &form).await?;
        }
        Filers::TickerFile(path) => {
            let tickers = read_ticker_file(&path)?;
            let resolver = cik_resolver(indexer)?;
            let mut unresolved = Vec::new();

            for ticker in &tickers {
                match resolver.resolve(ticker).await {
                    Ok(cik) => {
                        download_filer(indexer, &cik, from_year, to_year, &form).await?;
                    }
                    Err(e) if e.is_lookup_failure() => {
                        warn!(%ticker, error = %e, "Could not resolve ticker");
                        unresolved.push(ticker.clone());
                    }
                    Err(e) => return Err(e),
                }
            }

            if !unresolved.is_empty() {
                return Err(EdgarError::Lookup {
                    ticker: unresolved.join(", "),
                    reason: format!(
                        "{} of {} tickers could not be resolved",
                        unresolved.len(),
                        tickers.len()
                    ),
                });
            }
        }
    }
    Ok(())
}

async fn download_filer(
    indexer: &SecIndexer,
    cik: &str,
    from_year: i32,
    to_year: i32,
    form: &FormFilter,
) -> edgar_rss::Result<()> {
    let query = FilingQuery::new(cik, from_year, to_year).with_form(form.clone());
    let urls = indexer.query(&query)?;

    let pb = progress_bar(urls.len() as u64);
    pb.set_message(format!("CIK {cik}"));
    let summary = indexer
        .downloader()
        .download_each(&urls, |url, _| {
            pb.set_message(filing_filename(url).unwrap_or_default());
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    println!(
        "CIK {}: downloaded {} of {} filings ({} failed)",
        cik,
        summary.downloaded.len(),
        summary.requested,
        summary.failed
    );
    Ok(())
}

pub(crate) async fn list(
    indexer: &SecIndexer,
    filers: Filers,
    from_year: i32,
    to_year: i32,
    form: FormFilter,
    json: bool,
) -> edgar_rss::Result<()> {
    let cik = match filers {
        Filers::Cik(cik) => cik,
        Filers::Ticker(ticker) => cik_resolver(indexer)?.resolve(&ticker).await?,
        Filers::TickerFile(_) => {
            return Err(EdgarError::InvalidSymbol(
                "list takes a single CIK or ticker".to_string(),
            ));
        }
    };

    let query = FilingQuery::new(cik, from_year, to_year).with_form(form);
    let records = indexer.store().find(&query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_table(&records);
    }
    Ok(())
}

fn print_table(records: &[FilingRecord]) {
    println!(
        "{:<22} {:<10} {:<12} {:<36} {}",
        "Accession", "Form", "Filed", "Company", "Instance document"
    );
    println!("{}", "-".repeat(110));

    for record in records {
        println!(
            "{:<22} {:<10} {:<12} {:<36} {}",
            record.accession_number,
            record.form_type.as_deref().unwrap_or("-"),
            record.filing_date.as_deref().unwrap_or("-"),
            truncate(record.company_name.as_deref().unwrap_or("-"), 36),
            record.xbrl_files.as_deref().unwrap_or("-"),
        );
    }

    println!();
    println!("{} filings", records.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}~")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("INTEL CORP", 36), "INTEL CORP");
        assert_eq!(truncate("ABCDEFGHIJ", 5), "ABCD~");
    }
}
