//! Columnar table built from JSON documents or assembled column by column

use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::json::reader::{infer_json_schema_from_iterator, ReaderBuilder};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// An Arrow record batch plus the column order it is known to be sorted by
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
    sorted_by: Vec<String>,
}

impl Table {
    pub fn new(batch: RecordBatch) -> Self {
        Table {
            batch,
            sorted_by: Vec::new(),
        }
    }

    /// Flag the table as sorted ascending by `columns`, in order.
    ///
    /// Fails when a column is not part of the schema; the row order itself is
    /// the caller's responsibility.
    pub fn with_sorted_by<S: AsRef<str>>(mut self, columns: &[S]) -> Result<Self> {
        let schema = self.batch.schema();
        let mut sorted_by = Vec::with_capacity(columns.len());
        for column in columns {
            let name = column.as_ref();
            schema.index_of(name)?;
            sorted_by.push(name.to_string());
        }
        self.sorted_by = sorted_by;
        Ok(self)
    }

    /// One row whose columns are the object's top-level keys
    pub fn from_json_object(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::UnexpectedShape(format!(
                "expected a JSON object, got {}",
                json_kind(value)
            )));
        }
        Self::from_json_records(std::slice::from_ref(value))
    }

    /// One row per object; the schema is inferred across all of them.
    ///
    /// Keys that only ever hold empty objects (e.g. `"links": {}`) are left
    /// out, since Parquet cannot store a struct without fields.
    pub fn from_json_records(records: &[Value]) -> Result<Self> {
        if let Some(bad) = records.iter().find(|r| !r.is_object()) {
            return Err(Error::UnexpectedShape(format!(
                "expected JSON objects as rows, got {}",
                json_kind(bad)
            )));
        }

        if records.is_empty() {
            return Ok(Table::new(RecordBatch::new_empty(Arc::new(Schema::empty()))));
        }

        let inferred = infer_json_schema_from_iterator(records.iter().map(Ok))?;
        let fields: Vec<Field> = inferred
            .fields()
            .iter()
            .filter_map(|f| prune_empty_structs(f))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        debug!(
            "Inferred {} columns from {} JSON records",
            schema.fields().len(),
            records.len()
        );

        if schema.fields().is_empty() {
            let options = RecordBatchOptions::new().with_row_count(Some(records.len()));
            let batch = RecordBatch::try_new_with_options(schema, Vec::new(), &options)?;
            return Ok(Table::new(batch));
        }

        let mut decoder = ReaderBuilder::new(schema.clone())
            .with_batch_size(records.len())
            .build_decoder()?;
        decoder.serialize(records)?;
        let batch = decoder
            .flush()?
            .unwrap_or_else(|| RecordBatch::new_empty(schema));

        Ok(Table::new(batch))
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn sorted_by(&self) -> &[String] {
        &self.sorted_by
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }
}

fn prune_empty_structs(field: &Field) -> Option<Field> {
    match field.data_type() {
        DataType::Struct(children) => {
            let kept: Vec<Field> = children
                .iter()
                .filter_map(|f| prune_empty_structs(f))
                .collect();
            if kept.is_empty() {
                debug!("Dropping empty object field `{}`", field.name());
                return None;
            }
            Some(field.clone().with_data_type(DataType::Struct(Fields::from(kept))))
        }
        DataType::List(item) => prune_empty_structs(item)
            .map(|item| field.clone().with_data_type(DataType::List(Arc::new(item)))),
        _ => Some(field.clone()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
