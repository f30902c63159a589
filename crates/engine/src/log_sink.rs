use regio_inventory::ActivityKey;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const HEADER: &str = "dataset name;reference product;location";

/// Receives the identities of deleted and created activities
pub trait DatasetLog {
    fn record_deleted(&mut self, records: &[ActivityKey]) -> io::Result<()>;

    fn record_created(&mut self, records: &[ActivityKey]) -> io::Result<()>;
}

/// Keeps records in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDatasetLog {
    pub deleted: Vec<ActivityKey>,
    pub created: Vec<ActivityKey>,
}

impl MemoryDatasetLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatasetLog for MemoryDatasetLog {
    fn record_deleted(&mut self, records: &[ActivityKey]) -> io::Result<()> {
        self.deleted.extend_from_slice(records);
        Ok(())
    }

    fn record_created(&mut self, records: &[ActivityKey]) -> io::Result<()> {
        self.created.extend_from_slice(records);
        Ok(())
    }
}

/// Appends `;`-separated records to two files in a directory
#[derive(Debug, Clone)]
pub struct CsvDatasetLog {
    deleted_path: PathBuf,
    created_path: PathBuf,
}

impl CsvDatasetLog {
    pub const DELETED_FILE: &'static str = "log deleted cement datasets.csv";
    pub const CREATED_FILE: &'static str = "log created cement datasets.csv";

    /// Truncate both logs in `dir` and write their headers
    pub fn create(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let log = Self {
            deleted_path: dir.join(Self::DELETED_FILE),
            created_path: dir.join(Self::CREATED_FILE),
        };
        for path in [&log.deleted_path, &log.created_path] {
            let mut file = File::create(path)?;
            writeln!(file, "{HEADER}")?;
        }

        log::info!("Dataset logs written to {}", dir.display());

        Ok(log)
    }

    pub fn deleted_path(&self) -> &Path {
        &self.deleted_path
    }

    pub fn created_path(&self) -> &Path {
        &self.created_path
    }

    fn append(path: &Path, records: &[ActivityKey]) -> io::Result<()> {
        let file = OpenOptions::new().append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            writeln!(
                writer,
                "{};{};{}",
                record.name, record.reference_product, record.location
            )?;
        }
        writer.flush()
    }
}

impl DatasetLog for CsvDatasetLog {
    fn record_deleted(&mut self, records: &[ActivityKey]) -> io::Result<()> {
        Self::append(&self.deleted_path, records)
    }

    fn record_created(&mut self, records: &[ActivityKey]) -> io::Result<()> {
        Self::append(&self.created_path, records)
    }
}
