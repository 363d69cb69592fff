//! JSON output adapter.

use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Result;
use faceprofile_core::PortraitReport;

/// JSON Lines / JSON array output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one report as a JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or writing fails.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write(&self, report: &PortraitReport) -> Result<()> {
        let json = serde_json::to_string(report)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    /// Writes a batch of reports as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or writing fails.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_array(&self, reports: &[PortraitReport], pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(reports)?
        } else {
            serde_json::to_string(reports)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error when flushing fails.
    #[allow(clippy::significant_drop_tightening)]
    pub fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
