//! Line format read by the recorder.
//!
//! ```text
//! log "hello" {"user": 1}     # call console.log with two arguments
//! warn plain words            # non-JSON text is a single string argument
//! !throw something broke      # report an uncaught error
//! !panic something exploded   # panic and recover
//! ```

use std::str::FromStr;

use anyhow::Context;
use logtap_protocol::Method;
use logtap_stringify::Value;

#[derive(Debug)]
pub enum Command {
    Call(Method, Vec<Value>),
    Throw(String),
    Panic(String),
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match head {
        "!throw" => Command::Throw(rest.to_string()),
        "!panic" => Command::Panic(rest.to_string()),
        _ => {
            let method = Method::from_str(head).with_context(|| format!("bad line: {line}"))?;
            Command::Call(method, parse_args(rest))
        }
    };
    Ok(Some(command))
}

/// Splits the argument text into values.
///
/// A sequence of JSON documents becomes one argument each. Anything that is
/// not JSON is passed as a single string.
fn parse_args(text: &str) -> Vec<Value> {
    if text.is_empty() {
        return Vec::new();
    }
    let parsed: Result<Vec<serde_json::Value>, _> =
        serde_json::Deserializer::from_str(text).into_iter().collect();
    match parsed {
        Ok(values) => values.into_iter().map(to_value).collect(),
        Err(_) => vec![Value::from(text)],
    }
}

fn to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::array(items.into_iter().map(to_value)),
        serde_json::Value::Object(map) => {
            Value::object(map.into_iter().map(|(key, value)| (key, to_value(value))))
        }
    }
}
