use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate};
use parquet::basic::Compression;
use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::Field;
use parquet::schema::parser::parse_message_type;
use parquet::schema::types::{Type, TypePtr};

use crate::error::LineupError;

/// A record that can be assembled column by column from a parquet row.
pub trait FromRow: Default {
    /// Columns to project. Unknown names are ignored.
    const COLUMNS: &'static [&'static str];
    /// Columns without which the file is unusable.
    const REQUIRED: &'static [&'static str] = &[];

    fn set(&mut self, column: &str, field: &Field);
}

pub fn read_table<T: FromRow>(path: &Path) -> Result<Vec<T>> {
    read_table_where(path, |_| true)
}

pub fn read_table_where<T: FromRow>(path: &Path, keep: impl Fn(&T) -> bool) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("open parquet reader {}", path.display()))?;
    let projection = project(&reader, path, T::COLUMNS, T::REQUIRED)?;
    let iter = reader
        .get_row_iter(Some(projection))
        .with_context(|| format!("iterate rows {}", path.display()))?;

    let mut out = Vec::new();
    for row in iter {
        let Ok(row) = row else {
            continue;
        };
        let mut record = T::default();
        for (name, field) in row.get_column_iter() {
            record.set(name.as_str(), field);
        }
        if keep(&record) {
            out.push(record);
        }
    }
    Ok(out)
}

pub fn column_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("open parquet reader {}", path.display()))?;
    let root = reader.metadata().file_metadata().schema_descr().root_schema();
    Ok(root
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect())
}

pub fn count_rows(path: &Path) -> Result<i64> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("open parquet reader {}", path.display()))?;
    Ok(reader.metadata().file_metadata().num_rows())
}

fn project(
    reader: &SerializedFileReader<File>,
    path: &Path,
    wanted: &[&str],
    required: &[&str],
) -> Result<Type> {
    let root = reader.metadata().file_metadata().schema_descr().root_schema();
    let fields: Vec<TypePtr> = root
        .get_fields()
        .iter()
        .filter(|f| wanted.contains(&f.name()))
        .cloned()
        .collect();
    for column in required {
        if !fields.iter().any(|f| f.name() == *column) {
            return Err(LineupError::MissingColumn {
                file: path.display().to_string(),
                column: (*column).to_string(),
            }
            .into());
        }
    }
    Type::group_type_builder(root.name())
        .with_fields(fields)
        .build()
        .context("build parquet projection")
}

pub fn as_i64(field: &Field) -> Option<i64> {
    match field {
        Field::Byte(v) => Some(i64::from(*v)),
        Field::Short(v) => Some(i64::from(*v)),
        Field::Int(v) => Some(i64::from(*v)),
        Field::Long(v) => Some(*v),
        Field::UByte(v) => Some(i64::from(*v)),
        Field::UShort(v) => Some(i64::from(*v)),
        Field::UInt(v) => Some(i64::from(*v)),
        Field::ULong(v) => i64::try_from(*v).ok(),
        Field::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        Field::Double(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        Field::Str(s) => s.trim().parse::<i64>().ok(),
        Field::TimestampMillis(v) => Some(*v),
        Field::TimestampMicros(v) => Some(*v / 1_000),
        _ => None,
    }
}

pub fn as_u64(field: &Field) -> Option<u64> {
    as_i64(field).and_then(|v| u64::try_from(v).ok())
}

pub fn as_f64(field: &Field) -> Option<f64> {
    let value = match field {
        Field::Float(v) => Some(f64::from(*v)),
        Field::Double(v) => Some(*v),
        Field::Str(s) => s.trim().parse::<f64>().ok(),
        other => as_i64(other).map(|v| v as f64),
    };
    value.filter(|v| v.is_finite())
}

pub fn as_bool(field: &Field) -> Option<bool> {
    match field {
        Field::Bool(v) => Some(*v),
        Field::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Some(true),
            "false" | "f" | "0" | "no" => Some(false),
            _ => None,
        },
        other => as_i64(other).map(|v| v != 0),
    }
}

pub fn as_string(field: &Field) -> Option<String> {
    match field {
        Field::Null => None,
        Field::Str(s) => Some(s.clone()),
        Field::Date(days) => NaiveDate::from_num_days_from_ce_opt(days + 719_163)
            .map(|d| d.format("%Y-%m-%d").to_string()),
        Field::TimestampMillis(ms) => {
            DateTime::from_timestamp_millis(*ms).map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        Field::TimestampMicros(us) => DateTime::from_timestamp_millis(*us / 1_000)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        Field::Bool(v) => Some(v.to_string()),
        Field::Float(v) => Some(v.to_string()),
        Field::Double(v) => Some(v.to_string()),
        other => as_i64(other).map(|v| v.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Int64(Vec<Option<i64>>),
    Double(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Double(v) => v.len(),
            ColumnValues::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn physical(&self) -> &'static str {
        match self {
            ColumnValues::Int64(_) => "INT64",
            ColumnValues::Double(_) => "DOUBLE",
            ColumnValues::Utf8(_) => "BINARY",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// An in-memory table of nullable columns, written as a single row group.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn int64(mut self, name: &str, values: Vec<Option<i64>>) -> Self {
        self.push(name, ColumnValues::Int64(values));
        self
    }

    pub fn double(mut self, name: &str, values: Vec<Option<f64>>) -> Self {
        self.push(name, ColumnValues::Double(values));
        self
    }

    pub fn utf8(mut self, name: &str, values: Vec<Option<String>>) -> Self {
        self.push(name, ColumnValues::Utf8(values));
        self
    }

    fn push(&mut self, name: &str, values: ColumnValues) {
        self.columns.push(Column {
            name: name.to_string(),
            values,
        });
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    fn message_type(&self) -> String {
        let mut fields = String::new();
        for column in &self.columns {
            let annotation = match column.values {
                ColumnValues::Utf8(_) => " (UTF8)",
                _ => "",
            };
            fields.push_str(&format!(
                "  OPTIONAL {} {}{};\n",
                column.values.physical(),
                column.name,
                annotation
            ));
        }
        format!("message {} {{\n{}}}", self.name, fields)
    }
}

pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if table.columns.is_empty() {
        return Err(anyhow!("table {} has no columns", table.name));
    }
    let rows = table.num_rows();
    if let Some(bad) = table.columns.iter().find(|c| c.values.len() != rows) {
        return Err(anyhow!(
            "table {} column {} has {} rows, expected {rows}",
            table.name,
            bad.name,
            bad.values.len()
        ));
    }

    let schema = Arc::new(
        parse_message_type(&table.message_type())
            .with_context(|| format!("schema for {}", table.name))?,
    );
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer =
        SerializedFileWriter::new(file, schema, props).context("open parquet writer")?;
    let mut row_group = writer.next_row_group().context("open row group")?;

    let mut columns = table.columns.iter();
    while let Some(mut column_writer) = row_group.next_column().context("next column")? {
        let column = columns
            .next()
            .ok_or_else(|| anyhow!("schema has more columns than {}", table.name))?;
        match &column.values {
            ColumnValues::Int64(values) => {
                let (data, defs) = split_levels(values, |v| *v);
                column_writer
                    .typed::<Int64Type>()
                    .write_batch(&data, Some(&defs), None)
                    .with_context(|| format!("write column {}", column.name))?;
            }
            ColumnValues::Double(values) => {
                let (data, defs) = split_levels(values, |v| *v);
                column_writer
                    .typed::<DoubleType>()
                    .write_batch(&data, Some(&defs), None)
                    .with_context(|| format!("write column {}", column.name))?;
            }
            ColumnValues::Utf8(values) => {
                let (data, defs) = split_levels(values, |v| ByteArray::from(v.as_str()));
                column_writer
                    .typed::<ByteArrayType>()
                    .write_batch(&data, Some(&defs), None)
                    .with_context(|| format!("write column {}", column.name))?;
            }
        }
        column_writer.close().context("close column")?;
    }
    row_group.close().context("close row group")?;
    writer.close().context("close parquet writer")?;
    Ok(())
}

fn split_levels<V, T>(values: &[Option<V>], convert: impl Fn(&V) -> T) -> (Vec<T>, Vec<i16>) {
    let mut data = Vec::with_capacity(values.len());
    let mut defs = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Some(v) => {
                data.push(convert(v));
                defs.push(1);
            }
            None => defs.push(0),
        }
    }
    (data, defs)
}

#[cfg(test)]
mod tests {
    use parquet::record::Field;

    use super::{Table, as_bool, as_f64, as_i64, as_string};

    #[test]
    fn field_coercions() {
        assert_eq!(as_i64(&Field::Int(7)), Some(7));
        assert_eq!(as_i64(&Field::Str(" 3930171 ".to_string())), Some(3_930_171));
        assert_eq!(as_i64(&Field::Double(2.5)), None);
        assert_eq!(as_f64(&Field::Long(4)), Some(4.0));
        assert_eq!(as_f64(&Field::Double(f64::NAN)), None);
        assert_eq!(as_bool(&Field::Str("True".to_string())), Some(true));
        assert_eq!(as_string(&Field::Null), None);
        assert_eq!(as_string(&Field::Date(0)).as_deref(), Some("1970-01-01"));
    }

    #[test]
    fn message_type_lists_columns() {
        let table = Table::new("demo")
            .int64("match_id", vec![Some(1)])
            .utf8("label", vec![None]);
        let message = table.message_type();
        assert!(message.contains("OPTIONAL INT64 match_id;"));
        assert!(message.contains("OPTIONAL BINARY label (UTF8);"));
        assert_eq!(table.num_rows(), 1);
    }
}
