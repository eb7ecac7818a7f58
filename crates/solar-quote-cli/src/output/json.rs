use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the computation envelope to stdout.
pub fn print_json(value: &Value) {
    if let Err(e) = write_json(&mut io::stdout().lock(), value) {
        log::error!("failed to write JSON output: {e}");
    }
}

fn write_json(out: &mut impl Write, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_are_kept_verbatim() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"result": {"invoice_total": "3635.66"}})).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"invoice_total\": \"3635.66\""));
        assert!(text.ends_with("}\n"));
    }
}
