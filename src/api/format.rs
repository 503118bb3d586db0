use serde_json::{Map, Number, Value};

use crate::database::{Cell, DecodedRow};

/// A record as it leaves the gateway: lower-case keys, lower-case string values.
pub type NormalizedRecord = Map<String, Value>;

/// Convert a decoded row into the public wire format.
///
/// Column names become lower-case keys and every text cell is lower-cased. Numbers,
/// booleans and nulls pass through untouched. Applied to every row, unconditionally.
pub fn normalize_row(row: DecodedRow) -> NormalizedRecord {
    row.fields
        .into_iter()
        .map(|field| (field.column.to_lowercase(), cell_to_value(field.value)))
        .collect()
}

pub fn normalize_rows(rows: Vec<DecodedRow>) -> Vec<NormalizedRecord> {
    rows.into_iter().map(normalize_row).collect()
}

fn cell_to_value(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Bool(b),
        Cell::Integer(i) => Value::Number(i.into()),
        Cell::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        Cell::Text(s) => Value::String(s.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_and_strings_are_lower_cased() {
        let row = DecodedRow::from_pairs([
            ("ID", Cell::Integer(1)),
            ("NOMBRE", Cell::Text("Ana".to_string())),
            ("EMAIL", Cell::Text("ana@x.com".to_string())),
        ]);
        let record = normalize_row(row);
        assert_eq!(
            Value::Object(record),
            json!({ "id": 1, "nombre": "ana", "email": "ana@x.com" })
        );
    }

    #[test]
    fn non_text_values_pass_through() {
        let row = DecodedRow::from_pairs([
            ("Activo", Cell::Bool(true)),
            ("Saldo", Cell::Float(10.5)),
            ("Apellido", Cell::Null),
        ]);
        let record = normalize_row(row);
        assert_eq!(record["activo"], json!(true));
        assert_eq!(record["saldo"], json!(10.5));
        assert_eq!(record["apellido"], Value::Null);
    }

    #[test]
    fn every_row_is_normalized() {
        let rows = vec![
            DecodedRow::from_pairs([("NOMBRE", Cell::Text("ANA".to_string()))]),
            DecodedRow::from_pairs([("NOMBRE", Cell::Text("Luis".to_string()))]),
        ];
        let records = normalize_rows(rows);
        assert_eq!(records[0]["nombre"], "ana");
        assert_eq!(records[1]["nombre"], "luis");
    }

    #[test]
    fn non_finite_floats_become_null() {
        let record = normalize_row(DecodedRow::from_pairs([("X", Cell::Float(f64::NAN))]));
        assert_eq!(record["x"], Value::Null);
    }
}
