//! Arrow layout of the SIC hierarchy: one struct column per grouping level

use crate::error::Result;
use crate::sic::types::{LevelEntry, SicClass, SicLevel};
use crate::table::Table;
use arrow::array::{ArrayRef, StringArray, StructArray};
use arrow::buffer::NullBuffer;
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// `{code, description}` as carried by each level column
pub fn level_fields() -> Fields {
    Fields::from(vec![
        Field::new("code", DataType::Utf8, true),
        Field::new("description", DataType::Utf8, true),
    ])
}

/// section, division, group (structs), class, description
pub fn sic_schema() -> Schema {
    let mut fields: Vec<Field> = SicLevel::ALL
        .iter()
        .map(|level| Field::new(level.column_name(), DataType::Struct(level_fields()), true))
        .collect();
    fields.push(Field::new("class", DataType::Utf8, true));
    fields.push(Field::new("description", DataType::Utf8, true));
    Schema::new(fields)
}

fn level_column(entries: &[Option<&LevelEntry>]) -> Result<ArrayRef> {
    let codes: StringArray = entries
        .iter()
        .map(|e| e.map(|e| e.code.as_str()))
        .collect();
    let descriptions: StringArray = entries
        .iter()
        .map(|e| e.and_then(|e| e.description.as_deref()))
        .collect();
    let validity = NullBuffer::from(entries.iter().map(|e| e.is_some()).collect::<Vec<_>>());

    let array = StructArray::try_new(
        level_fields(),
        vec![Arc::new(codes) as ArrayRef, Arc::new(descriptions) as ArrayRef],
        Some(validity),
    )?;
    Ok(Arc::new(array))
}

/// Assemble the table and mark it sorted by the level columns.
///
/// `classes` must already be in hierarchy order, as returned by
/// [`crate::sic::transform::build_hierarchy`].
pub fn classes_to_table(classes: &[SicClass]) -> Result<Table> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(5);

    for level in SicLevel::ALL {
        let entries: Vec<Option<&LevelEntry>> = classes.iter().map(|c| c.level(level)).collect();
        columns.push(level_column(&entries)?);
    }

    let class: StringArray = classes.iter().map(|c| c.class.as_deref()).collect();
    let description: StringArray = classes.iter().map(|c| c.description.as_deref()).collect();
    columns.push(Arc::new(class));
    columns.push(Arc::new(description));

    let batch = RecordBatch::try_new(Arc::new(sic_schema()), columns)?;
    let sorted_by: Vec<&str> = SicLevel::ALL.iter().map(|l| l.column_name()).collect();
    Table::new(batch).with_sorted_by(&sorted_by)
}
