//! ViolationJournal - append-only local log of detected violations
//!
//! The journal is the system of record: every violation is written and
//! flushed synchronously before anything else happens to it. A write
//! failure is returned to the caller and is expected to end the run.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use contracts::{RadarError, ViolationEvent};
use tracing::debug;

#[derive(Debug)]
pub struct ViolationJournal {
    path: PathBuf,
    writer: BufWriter<File>,
    records: u64,
}

impl ViolationJournal {
    /// Open the journal for appending, creating parent directories as
    /// needed, and write the run header.
    pub fn create(path: &Path, run_id: Option<&str>) -> Result<Self, RadarError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    RadarError::journal_open(path.display().to_string(), e.to_string())
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| RadarError::journal_open(path.display().to_string(), e.to_string()))?;

        let mut journal = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            records: 0,
        };

        journal
            .write_header(run_id)
            .map_err(|e| RadarError::journal_write(journal.path.display().to_string(), e.to_string()))?;

        debug!(path = %journal.path.display(), "violation journal opened");
        Ok(journal)
    }

    /// Append one violation record and flush it to disk.
    pub fn append(&mut self, event: &ViolationEvent) -> Result<(), RadarError> {
        let number = self.records + 1;
        self.write_record(number, event)
            .map_err(|e| RadarError::journal_write(self.path.display().to_string(), e.to_string()))?;
        self.records = number;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered records and sync the file to disk.
    pub fn close(mut self) -> Result<(), RadarError> {
        self.writer
            .flush()
            .and_then(|()| self.writer.get_ref().sync_all())
            .map_err(|e| RadarError::journal_write(self.path.display().to_string(), e.to_string()))
    }

    fn write_header(&mut self, run_id: Option<&str>) -> io::Result<()> {
        let rule = "=".repeat(100);
        writeln!(self.writer, "{rule}")?;
        writeln!(self.writer, "SPEED VIOLATIONS LOG")?;
        writeln!(self.writer, "Run:     {}", run_id.unwrap_or("-"))?;
        writeln!(
            self.writer,
            "Started: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(self.writer, "{rule}")?;
        self.writer.flush()
    }

    fn write_record(&mut self, number: u64, event: &ViolationEvent) -> io::Result<()> {
        writeln!(self.writer, "VIOLATION #{number}")?;
        writeln!(self.writer, "  Plate:       {}", event.display_id)?;
        writeln!(self.writer, "  Vehicle:     {}", event.entity_id)?;
        if event.description.is_empty() {
            writeln!(self.writer, "  Zone:        {}", event.zone_id)?;
        } else {
            writeln!(
                self.writer,
                "  Zone:        {} ({})",
                event.zone_id, event.description
            )?;
        }
        writeln!(self.writer, "  Tick:        {}", event.tick)?;
        writeln!(self.writer, "  Location:    {}", event.location)?;
        writeln!(
            self.writer,
            "  Speed limit: {:.2} m/s ({:.1} km/h)",
            event.speed_limit, event.speed_limit_kmh
        )?;
        writeln!(
            self.writer,
            "  Speed:       {:.2} m/s ({:.1} km/h)",
            event.speed, event.speed_kmh
        )?;
        writeln!(self.writer, "  Overspeed:   +{:.1} km/h", event.overspeed_kmh)?;
        writeln!(self.writer, "{}", "-".repeat(100))?;
        self.writer.flush()
    }
}
