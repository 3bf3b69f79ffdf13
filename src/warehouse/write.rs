//! Write functions - serialize a table to Parquet without touching disk

use crate::error::{Error, Result};
use crate::table::Table;
use parquet::arrow::{ArrowSchemaConverter, ArrowWriter};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::SortingColumn;
use tracing::debug;

/// Leaf column index for each `sorted_by` column, ascending with nulls first.
///
/// A nested column is represented by its first leaf, so a `{code,
/// description}` struct sorts on `code`.
pub fn sorting_columns(table: &Table) -> Result<Vec<SortingColumn>> {
    if table.sorted_by().is_empty() {
        return Ok(Vec::new());
    }

    let schema = table.batch().schema();
    let descriptor = ArrowSchemaConverter::new().convert(schema.as_ref())?;

    table
        .sorted_by()
        .iter()
        .map(|name| {
            let idx = descriptor
                .columns()
                .iter()
                .position(|col| col.path().parts().first() == Some(name))
                .ok_or_else(|| {
                    Error::UnexpectedShape(format!("sort column `{}` has no parquet leaf", name))
                })?;
            Ok(SortingColumn::new(idx as i32, false, true))
        })
        .collect()
}

pub fn writer_properties(table: &Table) -> Result<WriterProperties> {
    let sorting = sorting_columns(table)?;
    let mut builder = WriterProperties::builder().set_compression(Compression::SNAPPY);
    if !sorting.is_empty() {
        builder = builder.set_sorting_columns(Some(sorting));
    }
    Ok(builder.build())
}

/// Whole table as one Parquet file in memory
pub fn to_parquet_bytes(table: &Table) -> Result<Vec<u8>> {
    let props = writer_properties(table)?;
    let mut buffer = Vec::new();

    let mut writer = ArrowWriter::try_new(&mut buffer, table.batch().schema(), Some(props))?;
    writer.write(table.batch())?;
    writer.close()?;

    debug!(
        "Serialized {} rows to {} bytes of parquet",
        table.num_rows(),
        buffer.len()
    );
    Ok(buffer)
}
