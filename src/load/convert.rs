use crate::load::utils;
use anyhow::Result;
use arrow::{
    array::{Array, ArrayRef, Float64Builder, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Convert every string column except `label` into `Float64`.
/// Cells that do not parse become null.
pub fn coerce_numeric(batch: &RecordBatch, label: &str) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut out = Vec::with_capacity(batch.num_columns());

    for (arr, fld) in batch.columns().iter().zip(schema.fields()) {
        match arr.as_any().downcast_ref::<StringArray>() {
            Some(sarr) if fld.name() != label => {
                let mut b = Float64Builder::with_capacity(sarr.len());
                for opt in sarr.iter() {
                    b.append_option(opt.and_then(utils::parse_number));
                }
                fields.push(Field::new(fld.name(), DataType::Float64, true));
                out.push(Arc::new(b.finish()) as ArrayRef);
            }

            // label and anything already typed
            _ => {
                fields.push(fld.as_ref().clone());
                out.push(arr.clone());
            }
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), out).map_err(Into::into)
}
