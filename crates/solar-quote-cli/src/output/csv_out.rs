use serde_json::Value;
use std::io;

use super::format_scalar;

/// Write the result as a two-column `field,value` CSV to stdout.
///
/// Series fields (line items, cash flow, monthly energy) are written as
/// their own header-plus-rows blocks after the scalar fields.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                if !is_series(val) {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
            }
            let _ = wtr.flush();
            drop(wtr);

            for (key, val) in map {
                if let Value::Array(rows) = val {
                    if is_series(val) {
                        println!();
                        println!("# {key}");
                        write_series(rows);
                    }
                }
            }
        }
        Value::Array(rows) => {
            drop(wtr);
            write_series(rows);
        }
        _ => {
            let _ = wtr.write_record([&format_scalar(result)]);
            let _ = wtr.flush();
        }
    }
}

fn is_series(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if rows.first().map_or(false, Value::is_object))
}

fn write_series(rows: &[Value]) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in rows {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in rows {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
    }

    let _ = wtr.flush();
}
