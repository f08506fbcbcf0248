use crate::error::ConfigError;
use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// A reporting window given as `YYYY` or `YYYY-MM`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Period {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    pub fn parse(period: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidPeriod(period.to_string());
        let (start_date, end_date) = match period.split_once('-') {
            None if is_digits(period, 4) => {
                let year = period.parse().map_err(|_| invalid())?;
                let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
                (start, end)
            }
            Some((year, month)) if is_digits(year, 4) && is_digits(month, 2) => {
                let year = year.parse().map_err(|_| invalid())?;
                let month = month.parse().map_err(|_| invalid())?;
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                (start, last_day_of_month(start).ok_or_else(invalid)?)
            }
            _ => return Err(invalid()),
        };
        Ok(Self {
            name: period.to_string(),
            start_date,
            end_date,
        })
    }

    /// Rewrites `startDate`, `endDate` and `resultsName` in the config file,
    /// keeping every other key untouched.
    pub fn write_to_config(&self, path: &Path) -> Result<(), ConfigError> {
        let json_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Map<String, Value> = serde_json::from_str(&json_str)?;
        config.insert("startDate".into(), self.start_date.to_string().into());
        config.insert("endDate".into(), self.end_date.to_string().into());
        config.insert("resultsName".into(), self.name.clone().into());

        let json_str = serde_json::to_string_pretty(&config)?;
        fs::write(path, json_str).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}
