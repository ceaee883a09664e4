//! Measurement names derived from report file names.
//!
//! Reports are saved as `<algo>_<test>_<YYYYMMDD>_<HHMM>.json`, e.g.
//! `bbr_test_20250114_1530.json`. The parsed name is handed to the output
//! sink explicitly.

use crate::error::{MeasureError, Result};
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementName {
    pub algorithm: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// `<algo>_<YYYYMMDD>_<HHMM>` as it appeared in the file name
    pub label: String,
}

impl MeasurementName {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MeasureError::InvalidFileName(path.display().to_string()))?;
        Self::from_file_name(file_name)
    }

    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let invalid = || MeasureError::InvalidFileName(file_name.to_string());

        let stem = file_name.split('.').next().unwrap_or_default();
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 4 || parts[0].is_empty() {
            return Err(invalid());
        }
        let (algorithm, date_str, time_str) = (parts[0], parts[2], parts[3]);

        let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").map_err(|_| invalid())?;
        let time = NaiveTime::parse_from_str(time_str, "%H%M").map_err(|_| invalid())?;

        Ok(Self {
            algorithm: algorithm.to_string(),
            date,
            time,
            label: format!("{}_{}_{}", algorithm, date_str, time_str),
        })
    }

    /// e.g. `BBR Test`
    pub fn title(&self) -> String {
        format!("{} Test", self.algorithm.to_uppercase())
    }

    /// e.g. `14.01.2025 15:30`
    pub fn subtitle(&self) -> String {
        format!("{} {}", self.date.format("%d.%m.%Y"), self.time.format("%H:%M"))
    }

    /// File name the external renderer writes its chart to
    pub fn plot_file_name(&self) -> String {
        format!("plot_{}.pdf", self.label)
    }
}
