use std::{
    collections::HashSet,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

use tokio::fs::DirBuilder;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::{aggregate::ScrapeReport, error::ExportError, listings::ListingRecord};

pub(crate) const COMBINED_FILE_NAME: &str = "combined_results.csv";
pub(crate) const ARCHIVE_FILE_NAME: &str = "scraped_results.zip";


/// Renders listings as CSV with a `title,price,location,url` header.
pub(crate) fn listings_csv<'a>(listings: impl IntoIterator<Item = &'a ListingRecord>) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(["title", "price", "location", "url"])?;
    for listing in listings {
        writer.serialize(listing)?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}


/// Bundles one table per query that found something, followed by the combined table.
///
/// Queries that share a file name get `_2`, `_3`, ... appended in registration order.
/// Returns `None` when no query found anything.
pub(crate) fn build_archive(report: &ScrapeReport) -> Result<Option<Vec<u8>>, ExportError> {
    if report.total_listings() == 0 {
        return Ok(None);
    }

    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let mut used = HashSet::from([COMBINED_FILE_NAME.to_string()]);
    for result in report.results.iter().filter(|result| !result.listings.is_empty()) {
        zip.start_file(unique_entry_name(&mut used, result.query.result_file_name()), options)?;
        zip.write_all(&listings_csv(&result.listings)?)?;
    }
    zip.start_file(COMBINED_FILE_NAME, options)?;
    zip.write_all(&listings_csv(report.combined())?)?;

    Ok(Some(zip.finish()?.into_inner()))
}


fn unique_entry_name(used: &mut HashSet<String>, name: String) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let stem = name.strip_suffix(".csv").unwrap_or(&name);
    let unique = (2..)
        .map(|n| format!("{stem}_{n}.csv"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_default();
    used.insert(unique.clone());
    unique
}


/// Writes the archive into `output_dir`, creating it if needed, and returns its path.
pub(crate) async fn write_archive(output_dir: &Path, archive: &[u8]) -> Result<PathBuf, ExportError> {
    DirBuilder::new().recursive(true).create(output_dir).await?;
    let path = output_dir.join(ARCHIVE_FILE_NAME);
    tokio::fs::write(&path, archive).await?;
    Ok(path)
}
