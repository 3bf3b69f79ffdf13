//! Typed, validated request parameters for each endpoint

use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::fmt;

/// Largest page the advanced search endpoint will return
pub const MAX_SEARCH_SIZE: u32 = 5000;

const COMPANY_NUMBER_LEN: usize = 8;

/// A Companies House registration number, e.g. `00000006` or `SC123456`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanyNumber(String);

impl CompanyNumber {
    /// Trim, upper-case and left-pad all-digit numbers to eight characters
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().to_ascii_uppercase();

        if trimmed.is_empty() {
            return Err(Error::InvalidParams("company number is empty".to_string()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidParams(format!(
                "company number {:?} must be alphanumeric",
                raw
            )));
        }

        let number = if trimmed.len() < COMPANY_NUMBER_LEN
            && trimmed.chars().all(|c| c.is_ascii_digit())
        {
            format!("{:0>width$}", trimmed, width = COMPANY_NUMBER_LEN)
        } else {
            trimmed
        };

        if number.len() != COMPANY_NUMBER_LEN {
            return Err(Error::InvalidParams(format!(
                "company number {:?} must be {} characters",
                raw, COMPANY_NUMBER_LEN
            )));
        }

        Ok(CompanyNumber(number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filters for the `advanced-search/companies` endpoint.
///
/// Build with struct-update syntax over `Default`:
///
/// ```
/// use chrono::NaiveDate;
/// use companies_house::api::AdvancedSearchParams;
///
/// let params = AdvancedSearchParams {
///     incorporated_from: NaiveDate::from_ymd_opt(2024, 5, 6),
///     incorporated_to: NaiveDate::from_ymd_opt(2024, 6, 5),
///     ..Default::default()
/// };
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedSearchParams {
    pub company_name_includes: Option<String>,
    pub company_name_excludes: Option<String>,
    pub company_status: Vec<String>,
    pub company_subtype: Option<String>,
    pub company_type: Vec<String>,
    pub dissolved_from: Option<NaiveDate>,
    pub dissolved_to: Option<NaiveDate>,
    pub incorporated_from: Option<NaiveDate>,
    pub incorporated_to: Option<NaiveDate>,
    pub location: Option<String>,
    pub sic_codes: Vec<String>,
    pub size: Option<u32>,
    pub start_index: Option<u32>,
}

impl AdvancedSearchParams {
    pub fn validate(&self) -> Result<()> {
        check_range("incorporated", self.incorporated_from, self.incorporated_to)?;
        check_range("dissolved", self.dissolved_from, self.dissolved_to)?;

        if let Some(size) = self.size {
            if size == 0 || size > MAX_SEARCH_SIZE {
                return Err(Error::InvalidParams(format!(
                    "size must be between 1 and {}, got {}",
                    MAX_SEARCH_SIZE, size
                )));
            }
        }

        let text_filters = [
            ("company_name_includes", self.company_name_includes.as_deref()),
            ("company_name_excludes", self.company_name_excludes.as_deref()),
            ("company_subtype", self.company_subtype.as_deref()),
            ("location", self.location.as_deref()),
        ];
        for (name, value) in text_filters {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(Error::InvalidParams(format!("{} is blank", name)));
            }
        }

        let list_filters = [
            ("company_status", &self.company_status),
            ("company_type", &self.company_type),
            ("sic_codes", &self.sic_codes),
        ];
        for (name, values) in list_filters {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(Error::InvalidParams(format!("{} contains a blank entry", name)));
            }
        }

        Ok(())
    }

    /// Validate, then flatten into query pairs; list filters repeat their key
    pub fn to_query(&self) -> Result<Vec<(&'static str, String)>> {
        self.validate()?;

        let mut query = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                query.push((key, v));
            }
        };

        push("company_name_includes", self.company_name_includes.clone());
        push("company_name_excludes", self.company_name_excludes.clone());
        push("company_subtype", self.company_subtype.clone());
        push("dissolved_from", self.dissolved_from.map(iso_date));
        push("dissolved_to", self.dissolved_to.map(iso_date));
        push("incorporated_from", self.incorporated_from.map(iso_date));
        push("incorporated_to", self.incorporated_to.map(iso_date));
        push("location", self.location.clone());
        push("size", self.size.map(|s| s.to_string()));
        push("start_index", self.start_index.map(|s| s.to_string()));

        for status in &self.company_status {
            query.push(("company_status", status.trim().to_string()));
        }
        for kind in &self.company_type {
            query.push(("company_type", kind.trim().to_string()));
        }
        for code in &self.sic_codes {
            query.push(("sic_codes", code.trim().to_string()));
        }

        Ok(query)
    }
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn check_range(name: &str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(Error::InvalidParams(format!(
            "{name}_from ({from}) is after {name}_to ({to})"
        ))),
        _ => Ok(()),
    }
}
