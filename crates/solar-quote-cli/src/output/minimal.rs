use serde_json::Value;

use super::format_scalar;

/// Headline figures, most specific first. A quote answers with its project
/// total; the single-stage commands with their own key figure.
const PRIORITY_KEYS: [&str; 9] = [
    "final_total",
    "project_total",
    "invoice_total",
    "project_fee",
    "payback",
    "effective_total",
    "average_monthly_consumption",
    "monthly_generation",
    "monthly_savings",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result_obj));
}
