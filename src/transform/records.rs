//! Arrow to JSON record conversion
//!
//! Columns are converted one at a time, then zipped into row objects whose
//! keys follow the schema's column order.

use crate::error::{Error, Result};
use crate::types::{format_timestamp, JsonObject, JsonValue};
use arrow::array::{
    Array, ArrowPrimitiveType, BinaryArray, BinaryViewArray, BooleanArray, FixedSizeBinaryArray,
    FixedSizeListArray, LargeBinaryArray, LargeListArray, LargeStringArray, ListArray, MapArray,
    PrimitiveArray, StringArray, StringViewArray, StructArray,
};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float16Type, Float32Type, Float64Type, Int16Type,
    Int32Type, Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::{date32_to_datetime, date64_to_datetime};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Number};

/// Convert a sequence of RecordBatches to records, preserving row order
pub fn batches_to_records(batches: &[RecordBatch]) -> Result<Vec<JsonObject>> {
    let total = batches.iter().map(RecordBatch::num_rows).sum();
    let mut records = Vec::with_capacity(total);
    for batch in batches {
        records.extend(batch_to_records(batch)?);
    }
    Ok(records)
}

/// Convert one RecordBatch to records, one object per row
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<JsonObject>> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        columns.push(column_to_json(field.name(), column.as_ref())?);
    }

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut record = Map::with_capacity(columns.len());
        for (field, values) in schema.fields().iter().zip(columns.iter_mut()) {
            record.insert(field.name().clone(), std::mem::take(&mut values[row]));
        }
        records.push(record);
    }

    Ok(records)
}

/// Convert every slot of an array to a JSON value
fn column_to_json(column: &str, array: &dyn Array) -> Result<Vec<JsonValue>> {
    match array.data_type() {
        DataType::Null => Ok(vec![JsonValue::Null; array.len()]),

        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(array, column)?;
            Ok(arr
                .iter()
                .map(|v| v.map_or(JsonValue::Null, JsonValue::Bool))
                .collect())
        }

        DataType::Int8 => primitive::<Int8Type>(array, column, |v| Ok(v.into())),
        DataType::Int16 => primitive::<Int16Type>(array, column, |v| Ok(v.into())),
        DataType::Int32 => primitive::<Int32Type>(array, column, |v| Ok(v.into())),
        DataType::Int64 => primitive::<Int64Type>(array, column, |v| Ok(v.into())),
        DataType::UInt8 => primitive::<UInt8Type>(array, column, |v| Ok(v.into())),
        DataType::UInt16 => primitive::<UInt16Type>(array, column, |v| Ok(v.into())),
        DataType::UInt32 => primitive::<UInt32Type>(array, column, |v| Ok(v.into())),
        DataType::UInt64 => primitive::<UInt64Type>(array, column, |v| {
            // Values past i64::MAX keep their digits as a string
            Ok(i64::try_from(v).map_or_else(|_| JsonValue::String(v.to_string()), JsonValue::from))
        }),

        DataType::Float16 => primitive::<Float16Type>(array, column, |v| Ok(float(v.to_f64()))),
        DataType::Float32 => {
            primitive::<Float32Type>(array, column, |v| Ok(float(f64::from(v))))
        }
        DataType::Float64 => primitive::<Float64Type>(array, column, |v| Ok(float(v))),

        DataType::Utf8 => Ok(strings(downcast::<StringArray>(array, column)?.iter())),
        DataType::LargeUtf8 => Ok(strings(downcast::<LargeStringArray>(array, column)?.iter())),
        DataType::Utf8View => Ok(strings(downcast::<StringViewArray>(array, column)?.iter())),

        DataType::Binary => Ok(binaries(downcast::<BinaryArray>(array, column)?.iter())),
        DataType::LargeBinary => Ok(binaries(downcast::<LargeBinaryArray>(array, column)?.iter())),
        DataType::BinaryView => Ok(binaries(downcast::<BinaryViewArray>(array, column)?.iter())),
        DataType::FixedSizeBinary(_) => Ok(binaries(
            downcast::<FixedSizeBinaryArray>(array, column)?.iter(),
        )),

        DataType::Timestamp(unit, _) => {
            // Stored values are UTC epoch offsets whatever the zone annotation
            match unit {
                TimeUnit::Second => primitive::<TimestampSecondType>(array, column, |v| {
                    timestamp(column, DateTime::from_timestamp(v, 0))
                }),
                TimeUnit::Millisecond => {
                    primitive::<TimestampMillisecondType>(array, column, |v| {
                        timestamp(column, DateTime::from_timestamp_millis(v))
                    })
                }
                TimeUnit::Microsecond => {
                    primitive::<TimestampMicrosecondType>(array, column, |v| {
                        timestamp(column, DateTime::from_timestamp_micros(v))
                    })
                }
                TimeUnit::Nanosecond => primitive::<TimestampNanosecondType>(array, column, |v| {
                    timestamp(column, Some(DateTime::from_timestamp_nanos(v)))
                }),
            }
        }

        DataType::Date32 => {
            primitive::<Date32Type>(array, column, |v| date(column, date32_to_datetime(v)))
        }
        DataType::Date64 => {
            primitive::<Date64Type>(array, column, |v| date(column, date64_to_datetime(v)))
        }

        DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => {
            let floats = cast(array, &DataType::Float64)?;
            column_to_json(column, floats.as_ref())
        }

        DataType::Dictionary(_, value_type) => {
            let decoded = cast(array, value_type)?;
            column_to_json(column, decoded.as_ref())
        }

        DataType::List(_) => {
            let arr = downcast::<ListArray>(array, column)?;
            nested(arr, column, |row| arr.value(row))
        }

        DataType::LargeList(_) => {
            let arr = downcast::<LargeListArray>(array, column)?;
            nested(arr, column, |row| arr.value(row))
        }

        DataType::FixedSizeList(_, _) => {
            let arr = downcast::<FixedSizeListArray>(array, column)?;
            nested(arr, column, |row| arr.value(row))
        }

        DataType::Struct(fields) => {
            let arr = downcast::<StructArray>(array, column)?;
            let mut children = Vec::with_capacity(fields.len());
            for (field, child) in fields.iter().zip(arr.columns()) {
                children.push(column_to_json(field.name(), child.as_ref())?);
            }

            let mut values = Vec::with_capacity(arr.len());
            for row in 0..arr.len() {
                if arr.is_null(row) {
                    values.push(JsonValue::Null);
                    continue;
                }
                let mut obj = Map::with_capacity(fields.len());
                for (field, child) in fields.iter().zip(children.iter_mut()) {
                    obj.insert(field.name().clone(), std::mem::take(&mut child[row]));
                }
                values.push(JsonValue::Object(obj));
            }
            Ok(values)
        }

        DataType::Map(_, _) => {
            let arr = downcast::<MapArray>(array, column)?;
            let mut values = Vec::with_capacity(arr.len());
            for row in 0..arr.len() {
                if arr.is_null(row) {
                    values.push(JsonValue::Null);
                    continue;
                }
                let entries = arr.value(row);
                let keys = column_to_json(column, entries.column(0).as_ref())?;
                let items = column_to_json(column, entries.column(1).as_ref())?;

                let mut obj = Map::with_capacity(keys.len());
                for (key, item) in keys.into_iter().zip(items) {
                    let key = match key {
                        JsonValue::String(s) => s,
                        other => other.to_string(),
                    };
                    obj.insert(key, item);
                }
                values.push(JsonValue::Object(obj));
            }
            Ok(values)
        }

        // Time, Duration, Interval and anything else Arrow can render
        other if can_cast_types(other, &DataType::Utf8) => {
            let rendered = cast(array, &DataType::Utf8)?;
            column_to_json(column, rendered.as_ref())
        }

        other => Err(Error::conversion(
            column,
            format!("unsupported data type {other}"),
        )),
    }
}

/// Downcast an array to its concrete type
fn downcast<'a, T: 'static>(array: &'a dyn Array, column: &str) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::conversion(
            column,
            format!(
                "failed to downcast {} to {}",
                array.data_type(),
                std::any::type_name::<T>()
            ),
        )
    })
}

/// Map each non-null slot of a primitive array through `convert`
fn primitive<T>(
    array: &dyn Array,
    column: &str,
    convert: impl Fn(T::Native) -> Result<JsonValue>,
) -> Result<Vec<JsonValue>>
where
    T: ArrowPrimitiveType,
{
    let arr = downcast::<PrimitiveArray<T>>(array, column)?;
    arr.iter()
        .map(|v| v.map_or(Ok(JsonValue::Null), &convert))
        .collect()
}

/// Convert each row of a list-like array to a JSON array
fn nested(
    array: &dyn Array,
    column: &str,
    value: impl Fn(usize) -> arrow::array::ArrayRef,
) -> Result<Vec<JsonValue>> {
    let mut values = Vec::with_capacity(array.len());
    for row in 0..array.len() {
        if array.is_null(row) {
            values.push(JsonValue::Null);
        } else {
            let items = column_to_json(column, value(row).as_ref())?;
            values.push(JsonValue::Array(items));
        }
    }
    Ok(values)
}

fn strings<'a>(iter: impl Iterator<Item = Option<&'a str>>) -> Vec<JsonValue> {
    iter.map(|v| v.map_or(JsonValue::Null, |s| JsonValue::String(s.to_string())))
        .collect()
}

fn binaries<'a>(iter: impl Iterator<Item = Option<&'a [u8]>>) -> Vec<JsonValue> {
    iter.map(|v| v.map_or(JsonValue::Null, |b| JsonValue::String(BASE64.encode(b))))
        .collect()
}

/// NaN and infinities have no JSON form and become null
fn float(value: f64) -> JsonValue {
    Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

fn timestamp(column: &str, ts: Option<DateTime<Utc>>) -> Result<JsonValue> {
    ts.map(|ts| JsonValue::String(format_timestamp(&ts)))
        .ok_or_else(|| Error::conversion(column, "timestamp out of range"))
}

fn date(column: &str, dt: Option<NaiveDateTime>) -> Result<JsonValue> {
    dt.map(|dt| JsonValue::String(dt.date().format("%Y-%m-%d").to_string()))
        .ok_or_else(|| Error::conversion(column, "date out of range"))
}
