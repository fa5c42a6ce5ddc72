//! Where year partitions live between partitioning and loading.
//!
//! [`PartitionStore`] is the seam the loader reads through. Two implementations:
//! - [`MemoryStore`] keeps the partitioner's output in memory.
//! - [`CsvDirStore`] keeps one `<year>.csv` file per partition in a directory,
//!   each with the source header. [`CsvDirStore::write_partitions`] produces
//!   such a directory from a [`YearPartitions`].
//!
//! The trait is annotated for `mockall` so tests can inject failing or slow stores.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use tracing::{debug, info, warn};

use crate::error::{Phase, Result, StatsError};
use crate::partition::{RawPartition, YearPartitions};
use crate::pool::run_blocking;
use crate::vacancy::RawRow;

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Years with a stored partition, ascending.
    async fn years(&self) -> Result<Vec<i32>>;

    /// Header and raw rows of one year.
    async fn read_partition(&self, year: i32) -> Result<RawPartition>;
}

pub struct MemoryStore {
    partitions: YearPartitions,
}

impl MemoryStore {
    pub fn new(partitions: YearPartitions) -> Self {
        Self { partitions }
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    async fn years(&self) -> Result<Vec<i32>> {
        Ok(self.partitions.years())
    }

    async fn read_partition(&self, year: i32) -> Result<RawPartition> {
        self.partitions
            .partition(year)
            .ok_or(StatsError::PartitionNotFound(year))
    }
}

pub struct CsvDirStore {
    dir: PathBuf,
}

impl CsvDirStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(StatsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("partition directory {} does not exist", dir.display()),
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, year: i32) -> PathBuf {
        self.dir.join(format!("{year}.csv"))
    }

    /// Writes every partition as `<dir>/<year>.csv`, creating `dir` if needed.
    pub fn write_partitions<P: AsRef<Path>>(dir: P, partitions: &YearPartitions) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let store = Self {
            dir: dir.to_path_buf(),
        };
        for (year, rows) in partitions.iter() {
            let path = store.path_for(year);
            let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
            writer.write_record(partitions.header())?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
            debug!(year, rows = rows.len(), path = %path.display(), "Partition written");
        }
        info!(
            dir = %dir.display(),
            partitions = partitions.len(),
            "Partitions written"
        );
        Ok(store)
    }
}

#[async_trait]
impl PartitionStore for CsvDirStore {
    async fn years(&self) -> Result<Vec<i32>> {
        let dir = self.dir.clone();
        run_blocking(Phase::Discover, move || list_years(&dir)).await
    }

    async fn read_partition(&self, year: i32) -> Result<RawPartition> {
        let path = self.path_for(year);
        run_blocking(Phase::Load, move || {
            if !path.exists() {
                return Err(StatsError::PartitionNotFound(year));
            }
            let (header, rows) = read_csv_path(&path)?;
            Ok(RawPartition { year, header, rows })
        })
        .await
    }
}

fn list_years(dir: &Path) -> Result<Vec<i32>> {
    let mut years = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        match path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<i32>().ok())
        {
            Some(year) => years.push(year),
            None => warn!(path = %path.display(), "Ignoring non-year file in partition directory"),
        }
    }
    years.sort_unstable();
    Ok(years)
}

/// Reads a CSV file into its header and rows.
pub fn read_csv_path<P: AsRef<Path>>(path: P) -> Result<(RawRow, Vec<RawRow>)> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

/// Reads CSV data into its header and rows.
///
/// Rows of any length are accepted; the loader decides what is well-formed.
/// A UTF-8 byte order mark on the header is dropped.
pub fn read_csv<R: Read>(reader: R) -> Result<(RawRow, Vec<RawRow>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let mut header: RawRow = reader.headers()?.iter().map(str::to_string).collect();
    if let Some(first) = header.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ragged_rows_and_strips_bom() {
        let data = "\u{feff}name,salary_from\nDev,100\nShort\n";
        let (header, rows) = read_csv(data.as_bytes()).unwrap();
        assert_eq!(header, vec!["name", "salary_from"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Short"]);
    }

    #[test]
    fn empty_input_has_no_header_and_no_rows() {
        let (header, rows) = read_csv("".as_bytes()).unwrap();
        assert!(header.is_empty());
        assert!(rows.is_empty());
    }
}
