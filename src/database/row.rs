use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::types::BigDecimal;
use sqlx::{Column, Row, TypeInfo};

/// A single decoded cell, typed by the column's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub column: String,
    pub value: Cell,
}

/// One result-set row with each value paired to its column descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedRow {
    pub fields: Vec<Field>,
}

impl DecodedRow {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Cell)>,
        S: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(column, value)| Field {
                    column: column.into(),
                    value,
                })
                .collect(),
        }
    }

    /// Look a value up by column name, ignoring case.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|f| f.column.eq_ignore_ascii_case(column))
            .map(|f| &f.value)
    }

    /// The value in the leftmost column.
    pub fn first_value(&self) -> Option<&Cell> {
        self.fields.first().map(|f| &f.value)
    }
}

pub fn decode_row(row: &PgRow) -> Result<DecodedRow, sqlx::Error> {
    let fields = row
        .columns()
        .iter()
        .map(|column| {
            Ok(Field {
                column: column.name().to_string(),
                value: decode_cell(row, column)?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;
    Ok(DecodedRow { fields })
}

fn decode_cell(row: &PgRow, column: &PgColumn) -> Result<Cell, sqlx::Error> {
    let index = column.ordinal();
    let cell = match column.type_info().name() {
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(|v| Cell::Integer(v.into())),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(|v| Cell::Integer(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Cell::Integer),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(|v| Cell::Float(v.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Cell::Float),
        "NUMERIC" => row
            .try_get::<Option<BigDecimal>, _>(index)?
            .map(|v| numeric_cell(&v.to_string())),
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Cell::Bool),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|v| Cell::Text(v.to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|v| Cell::Text(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|v| Cell::Text(v.to_rfc3339())),
        _ => row.try_get::<Option<String>, _>(index)?.map(Cell::Text),
    };
    Ok(cell.unwrap_or(Cell::Null))
}

/// NUMERIC values with no fractional part become integers.
fn numeric_cell(text: &str) -> Cell {
    let whole = match text.split_once('.') {
        Some((int, frac)) if frac.chars().all(|c| c == '0') => int,
        Some(_) => "",
        None => text,
    };
    if let Ok(v) = whole.parse::<i64>() {
        return Cell::Integer(v);
    }
    match text.parse::<f64>() {
        Ok(v) => Cell::Float(v),
        Err(_) => Cell::Text(text.to_string()),
    }
}
