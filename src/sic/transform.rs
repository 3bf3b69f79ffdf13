//! Reshape normalized worksheet rows into the class hierarchy

use crate::sic::types::{is_class_heading, LevelEntry, SicClass, SicLevel, SicSheetRow};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Code -> entry for one grouping level. The first row for a code wins.
pub fn level_lookup(rows: &[SicSheetRow], level: SicLevel) -> HashMap<String, LevelEntry> {
    let mut lookup = HashMap::new();

    for row in rows {
        let is_level = row
            .level_headings
            .as_deref()
            .and_then(SicLevel::from_heading)
            == Some(level);
        if !is_level {
            continue;
        }

        let Some(code) = row.code(level) else {
            continue;
        };

        if lookup.contains_key(code) {
            debug!("Duplicate {} code {}; keeping the first entry", level, code);
            continue;
        }
        lookup.insert(
            code.to_string(),
            LevelEntry {
                code: code.to_string(),
                description: row.description.clone(),
            },
        );
    }

    debug!("Built {} lookup with {} entries", level, lookup.len());
    lookup
}

/// Build the sorted class table.
///
/// Each class gets its section, division and group left-joined on by plain
/// code; an unmatched code leaves that level `None`. Output is ordered by the
/// joined (section, division, group) codes with unmatched levels first,
/// keeping worksheet order within a group. This is the order the level
/// columns hold once written, so it can be declared as their sort order.
pub fn build_hierarchy(rows: &[SicSheetRow]) -> Vec<SicClass> {
    let lookups: Vec<(SicLevel, HashMap<String, LevelEntry>)> = SicLevel::ALL
        .iter()
        .map(|level| (*level, level_lookup(rows, *level)))
        .collect();

    let join = |row: &SicSheetRow, level: SicLevel| -> Option<LevelEntry> {
        let code = row.code(level)?;
        let entry = lookups
            .iter()
            .find(|(l, _)| *l == level)
            .and_then(|(_, lookup)| lookup.get(code))
            .cloned();
        if entry.is_none() {
            warn!("No {} entry for code {}", level, code);
        }
        entry
    };

    let mut classes: Vec<SicClass> = rows
        .iter()
        .filter(|row| row.level_headings.as_deref().is_some_and(is_class_heading))
        .map(|row| SicClass {
            section: join(row, SicLevel::Section),
            division: join(row, SicLevel::Division),
            group: join(row, SicLevel::Group),
            class: row.most_disaggregated_level.clone(),
            description: row.description.clone(),
        })
        .collect();

    classes.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    info!("Built SIC hierarchy with {} classes", classes.len());
    classes
}

/// Joined level codes; `None` orders before any code
fn sort_key(class: &SicClass) -> [Option<&str>; 3] {
    SicLevel::ALL.map(|level| class.level(level).map(|entry| entry.code.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        heading: &str,
        section: Option<&str>,
        division: Option<&str>,
        group: Option<&str>,
        most: Option<&str>,
        description: &str,
    ) -> SicSheetRow {
        SicSheetRow {
            level_headings: Some(heading.to_string()),
            section: section.map(String::from),
            division: division.map(String::from),
            group: group.map(String::from),
            most_disaggregated_level: most.map(String::from),
            description: Some(description.to_string()),
        }
    }

    fn sample_rows() -> Vec<SicSheetRow> {
        vec![
            row("Section", Some("B"), None, None, Some("B"), "MINING AND QUARRYING"),
            row("Division", Some("B"), Some("05"), None, Some("05"), "Mining of coal and lignite"),
            row("Group", Some("B"), Some("05"), Some("05.1"), Some("05.1"), "Mining of hard coal"),
            row("Class", Some("B"), Some("05"), Some("05.1"), Some("05.10"), "Mining of hard coal"),
            row("Section", Some("A"), None, None, Some("A"), "AGRICULTURE, FORESTRY AND FISHING"),
            row("Division", Some("A"), Some("01"), None, Some("01"), "Crop and animal production"),
            row("Group", Some("A"), Some("01"), Some("01.1"), Some("01.1"), "Growing of non-perennial crops"),
            row("Class", Some("A"), Some("01"), Some("01.1"), Some("01.11"), "Growing of cereals"),
            row("Sub Class", Some("A"), Some("01"), Some("01.1"), Some("01.11/1"), "Growing of wheat"),
        ]
    }

    #[test]
    fn test_only_classes_are_kept() {
        let classes = build_hierarchy(&sample_rows());
        let codes: Vec<_> = classes.iter().map(|c| c.class.as_deref().unwrap()).collect();
        assert_eq!(codes, vec!["01.11", "01.11/1", "05.10"]);
    }

    #[test]
    fn test_nested_codes_match_join_keys() {
        let rows = sample_rows();
        let classes = build_hierarchy(&rows);

        for class in &classes {
            let source = rows
                .iter()
                .filter(|r| is_class_heading(r.level_headings.as_deref().unwrap()))
                .find(|r| r.most_disaggregated_level == class.class)
                .unwrap();
            for level in SicLevel::ALL {
                let entry = class.level(level).unwrap();
                assert_eq!(Some(entry.code.as_str()), source.code(level));
            }
        }

        let cereals = &classes[0];
        assert_eq!(
            cereals.section.as_ref().unwrap().description.as_deref(),
            Some("AGRICULTURE, FORESTRY AND FISHING")
        );
        assert_eq!(
            cereals.group.as_ref().unwrap().description.as_deref(),
            Some("Growing of non-perennial crops")
        );
        assert_eq!(cereals.description.as_deref(), Some("Growing of cereals"));
    }

    #[test]
    fn test_sorted_by_section_division_group() {
        let classes = build_hierarchy(&sample_rows());
        let sections: Vec<_> = classes
            .iter()
            .map(|c| c.section.as_ref().unwrap().code.as_str())
            .collect();

        let first_b = sections.iter().position(|s| *s == "B").unwrap();
        assert!(sections[..first_b].iter().all(|s| *s == "A"));
        assert!(sections[first_b..].iter().all(|s| *s == "B"));
    }

    #[test]
    fn test_unmatched_group_is_null_not_dropped() {
        let mut rows = sample_rows();
        rows.push(row("Class", Some("A"), Some("01"), Some("01.9"), Some("01.90"), "Orphan"));

        let classes = build_hierarchy(&rows);
        assert_eq!(classes.len(), 4);

        let orphan = classes
            .iter()
            .find(|c| c.class.as_deref() == Some("01.90"))
            .unwrap();
        assert!(orphan.group.is_none());
        assert_eq!(orphan.division.as_ref().unwrap().code, "01");
        assert_eq!(orphan.section.as_ref().unwrap().code, "A");
    }

    #[test]
    fn test_unmatched_group_sorts_first_in_its_division() {
        let mut rows = sample_rows();
        rows.push(row("Class", Some("A"), Some("01"), Some("01.9"), Some("01.90"), "Orphan"));

        let classes = build_hierarchy(&rows);
        let order: Vec<_> = classes.iter().map(|c| c.class.as_deref().unwrap()).collect();
        assert_eq!(order, vec!["01.90", "01.11", "01.11/1", "05.10"]);

        let groups: Vec<Option<&str>> = classes
            .iter()
            .map(|c| c.group.as_ref().map(|g| g.code.as_str()))
            .collect();
        assert_eq!(groups, vec![None, Some("01.1"), Some("01.1"), Some("05.1")]);
    }

    #[test]
    fn test_duplicate_lookup_keeps_first() {
        let rows = vec![
            row("Group", Some("A"), Some("01"), Some("01.1"), Some("01.1"), "first"),
            row("Group", Some("A"), Some("01"), Some("01.1"), Some("01.1"), "second"),
        ];
        let lookup = level_lookup(&rows, SicLevel::Group);
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup["01.1"].description.as_deref(), Some("first"));
    }
}
