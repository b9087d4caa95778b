//! Decoder for PHP session files.
//!
//! Two layouts are understood:
//! - the default `php` handler, a run of `name|<serialized value>` entries
//! - the `php_serialize` handler, one serialized array holding every variable
//!
//! Values come back as [`serde_json::Value`]. Arrays and objects become maps
//! with stringified keys; references decode to null.

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Number, Value};

/// Decode the contents of one PHP session file into a map of session variables.
pub fn unserialize_session(content: &str) -> Result<Value> {
    if content.starts_with("a:") {
        let mut reader = Reader::new(content);
        if let Ok(value) = reader.value() {
            if reader.at_end() {
                return Ok(value);
            }
        }
    }

    let mut reader = Reader::new(content);
    let mut vars = Map::new();
    while !reader.at_end() {
        let offset = reader.pos;
        let name = reader
            .take_until('|')
            .with_context(|| format!("Expected `name|value` at offset {}", offset))?;
        let value = reader
            .value()
            .with_context(|| format!("Invalid value for session variable {:?}", name))?;
        vars.insert(name.to_string(), value);
    }
    Ok(Value::Object(vars))
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.rest().trim().is_empty()
    }

    fn take_until(&mut self, delim: char) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest.find(delim)?;
        self.pos += end + delim.len_utf8();
        Some(&rest[..end])
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if !self.rest().starts_with(token) {
            bail!("Expected {:?} at offset {}", token, self.pos);
        }
        self.pos += token.len();
        Ok(())
    }

    fn number<T>(&mut self, delim: char) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let offset = self.pos;
        let raw = self
            .take_until(delim)
            .with_context(|| format!("Unterminated number at offset {}", offset))?;
        raw.parse()
            .with_context(|| format!("Invalid number {:?} at offset {}", raw, offset))
    }

    /// `<len>:"<len bytes>"`
    fn quoted(&mut self) -> Result<&'a str> {
        let len: usize = self.number(':')?;
        self.expect("\"")?;
        let start = self.pos;
        let body = self
            .input
            .get(start..start.saturating_add(len))
            .with_context(|| format!("String of {} bytes at offset {} is truncated", len, start))?;
        self.pos += len;
        self.expect("\"")?;
        Ok(body)
    }

    fn value(&mut self) -> Result<Value> {
        let offset = self.pos;
        if self.rest().starts_with("N;") {
            self.pos += 2;
            return Ok(Value::Null);
        }
        let Some(tag) = self.rest().chars().next() else {
            bail!("Unexpected end of input at offset {}", offset);
        };
        self.pos += tag.len_utf8();
        self.expect(":")?;

        match tag {
            'b' => Ok(Value::Bool(self.number::<u8>(';')? != 0)),
            'i' => Ok(Value::from(self.number::<i64>(';')?)),
            // INF and NAN have no JSON form.
            'd' => Ok(Number::from_f64(self.number::<f64>(';')?).map_or(Value::Null, Value::Number)),
            's' => {
                let s = self.quoted()?;
                self.expect(";")?;
                Ok(Value::String(s.to_string()))
            }
            'a' => self.entries(),
            'O' => {
                self.quoted()?;
                self.expect(":")?;
                self.entries()
            }
            'r' | 'R' => {
                self.number::<i64>(';')?;
                Ok(Value::Null)
            }
            other => bail!("Unsupported value type {:?} at offset {}", other, offset),
        }
    }

    /// `<count>:{<key><value>...}`
    fn entries(&mut self) -> Result<Value> {
        let count: usize = self.number(':')?;
        self.expect("{")?;

        let mut map = Map::new();
        for _ in 0..count {
            let offset = self.pos;
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => bail!("Invalid array key {} at offset {}", other, offset),
            };
            let value = self.value()?;
            map.insert(key, value);
        }

        self.expect("}")?;
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_php_handler_entries() {
        let value = unserialize_session(
            r#"useragent|s:11:"curl/7.68.0";visits|i:1;ratio|d:0.5;ok|b:1;user|N;"#,
        )
        .unwrap();
        assert_eq!(
            value,
            json!({"useragent": "curl/7.68.0", "visits": 1, "ratio": 0.5, "ok": true, "user": null})
        );
    }

    #[test]
    fn test_nested_arrays_use_string_keys() {
        let value =
            unserialize_session(r#"history|a:1:{i:0;a:2:{s:9:"timestamp";i:10;s:4:"host";s:3:"a.b";}}"#)
                .unwrap();
        assert_eq!(value, json!({"history": {"0": {"timestamp": 10, "host": "a.b"}}}));
    }

    #[test]
    fn test_php_serialize_handler() {
        let value = unserialize_session(r#"a:2:{s:6:"visits";i:3;s:4:"last";i:99;}"#).unwrap();
        assert_eq!(value, json!({"visits": 3, "last": 99}));
    }

    #[test]
    fn test_string_length_counts_bytes() {
        // "Zürich|x" is 9 bytes; the embedded quote and bar belong to the string.
        let value = unserialize_session(r#"city|s:9:"Zürich|x";note|s:3:"a"b";"#).unwrap();
        assert_eq!(value, json!({"city": "Zürich|x", "note": "a\"b"}));
    }

    #[test]
    fn test_objects_and_references() {
        let value =
            unserialize_session(r#"user|O:8:"stdClass":1:{s:4:"name";s:5:"alice";}again|r:2;"#)
                .unwrap();
        assert_eq!(value, json!({"user": {"name": "alice"}, "again": null}));
    }

    #[test]
    fn test_empty_file_has_no_variables() {
        assert_eq!(unserialize_session("").unwrap(), json!({}));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(unserialize_session(r#"visits|i:abc;"#).is_err());
        assert!(unserialize_session(r#"useragent|s:40:"short";"#).is_err());
        assert!(unserialize_session("no separator here").is_err());
        assert!(unserialize_session(r#"x|a:2:{i:0;i:1;}"#).is_err());
    }
}
