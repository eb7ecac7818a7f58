use serde_json::Value;
use std::io::{self, Read};

/// A piped quote request, or `None` when stdin is a terminal or carries nothing.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    let bytes = io::stdin().read_to_string(&mut buffer)?;
    log::debug!("read {bytes} bytes of request JSON from stdin");

    match buffer.trim() {
        "" => Ok(None),
        request => Ok(Some(serde_json::from_str(request)?)),
    }
}
