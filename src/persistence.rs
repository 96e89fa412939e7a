use crate::codec::{packed_to_unpacked, PackedCoefficients};
use crate::error::MfResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One checkpoint row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: usize,
    pub qubits: usize,
    pub iteration: usize,
    pub best_mu: f64,
    pub radius: f64,
    pub status: String,
    /// Unpacked coefficients, `;`-separated.
    pub xbest: String,
}

impl RunRecord {
    pub fn new(
        run_id: usize,
        iteration: usize,
        best_mu: f64,
        radius: f64,
        status: impl Into<String>,
        xbest: &PackedCoefficients,
    ) -> MfResult<Self> {
        let qubits = xbest.qubits();
        let flat = packed_to_unpacked(xbest, qubits)?;
        Ok(Self {
            run_id,
            qubits,
            iteration,
            best_mu,
            radius,
            status: status.into(),
            xbest: flat
                .as_slice()
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(";"),
        })
    }

    pub fn coefficients(&self) -> MfResult<Vec<f64>> {
        let parsed: crate::codec::UnpackedCoefficients = self.xbest.replace(';', ",").parse()?;
        Ok(parsed.0)
    }
}

pub trait ResultSink {
    fn record(&mut self, record: &RunRecord) -> MfResult<()>;

    fn flush(&mut self) -> MfResult<()> {
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn record(&mut self, record: &RunRecord) -> MfResult<()> {
        (**self).record(record)
    }

    fn flush(&mut self) -> MfResult<()> {
        (**self).flush()
    }
}

/// Writes records as CSV rows with a header.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn create<P: AsRef<Path>>(path: P) -> MfResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!("Opening result file {}", path.display());
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl ResultSink for CsvSink {
    fn record(&mut self, record: &RunRecord) -> MfResult<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    fn flush(&mut self) -> MfResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<RunRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RunRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ResultSink for MemorySink {
    fn record(&mut self, record: &RunRecord) -> MfResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn record(&mut self, _record: &RunRecord) -> MfResult<()> {
        Ok(())
    }
}

pub fn read_records<P: AsRef<Path>>(path: P) -> MfResult<Vec<RunRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize() {
        out.push(row?);
    }
    Ok(out)
}
