//! `application/x-www-form-urlencoded` decoding.
//!
//! Used for both query strings and form bodies. Keys ending in `[]`
//! accumulate into arrays (`tag[]=a&tag[]=b` → `{"tag": ["a", "b"]}`); any
//! other repeated key keeps its last value.

use serde_json::{Map, Value};

/// Decodes a single component: `+` becomes a space and `%XX` a byte.
///
/// Malformed escapes are kept verbatim. Invalid UTF-8 is replaced.
pub fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parses a query string or form body into a map of string values.
pub fn parse_query(input: &str) -> Map<String, Value> {
    let mut map = Map::new();
    let input = input.strip_prefix('?').unwrap_or(input);

    for pair in input.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key);
        let value = Value::String(decode_component(raw_value));

        match key.strip_suffix("[]") {
            Some(base) if !base.is_empty() => {
                let entry = map
                    .entry(base.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry {
                    Value::Array(items) => items.push(value),
                    other => *other = Value::Array(vec![value]),
                }
            }
            _ => {
                if !key.is_empty() {
                    map.insert(key, value);
                }
            }
        }
    }
    map
}
