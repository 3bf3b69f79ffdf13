//! Core data types for the SIC code pipeline
//! Pure data structures with no behavior beyond naming

use std::fmt;

/// Grouping levels above "class", outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SicLevel {
    Section,
    Division,
    Group,
}

impl SicLevel {
    pub const ALL: [SicLevel; 3] = [SicLevel::Section, SicLevel::Division, SicLevel::Group];

    /// Column name in the normalized worksheet and in the output table
    pub fn column_name(&self) -> &'static str {
        match self {
            SicLevel::Section => "section",
            SicLevel::Division => "division",
            SicLevel::Group => "group",
        }
    }

    /// Match a "Level headings" cell, ignoring case
    pub fn from_heading(heading: &str) -> Option<SicLevel> {
        match heading.trim().to_lowercase().as_str() {
            "section" => Some(SicLevel::Section),
            "division" => Some(SicLevel::Division),
            "group" => Some(SicLevel::Group),
            _ => None,
        }
    }
}

impl fmt::Display for SicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// True for the most granular rows ("Class" and "Sub Class")
pub fn is_class_heading(heading: &str) -> bool {
    matches!(
        heading.trim().to_lowercase().as_str(),
        "class" | "sub class"
    )
}

/// One worksheet row after header normalization and whitespace stripping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SicSheetRow {
    pub level_headings: Option<String>,
    pub section: Option<String>,
    pub division: Option<String>,
    pub group: Option<String>,
    pub most_disaggregated_level: Option<String>,
    pub description: Option<String>,
}

impl SicSheetRow {
    pub fn code(&self, level: SicLevel) -> Option<&str> {
        match level {
            SicLevel::Section => self.section.as_deref(),
            SicLevel::Division => self.division.as_deref(),
            SicLevel::Group => self.group.as_deref(),
        }
    }
}

/// Code and description of one grouping level, nested under its class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEntry {
    pub code: String,
    pub description: Option<String>,
}

/// A class with its section, division and group joined on.
///
/// A level is `None` when its code had no entry in that level's lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SicClass {
    pub section: Option<LevelEntry>,
    pub division: Option<LevelEntry>,
    pub group: Option<LevelEntry>,
    pub class: Option<String>,
    pub description: Option<String>,
}

impl SicClass {
    pub fn level(&self, level: SicLevel) -> Option<&LevelEntry> {
        match level {
            SicLevel::Section => self.section.as_ref(),
            SicLevel::Division => self.division.as_ref(),
            SicLevel::Group => self.group.as_ref(),
        }
    }
}
