//! Bounded, cycle-safe rendering of values as text.
//!
//! Composites are walked depth-first and written out as JSON text. A
//! composite is summarized by its textual conversion (or a generic fallback)
//! instead of walked when it sits at `depth_of_limit` or has more than
//! `num_of_keys_limit` own keys. Ancestors on the current path render as
//! `[Circular ~...]` markers. With a length limit the walk stops as soon as
//! the output is longer than the limit, so shared subgraphs never multiply
//! the work past what can be shown.

use std::sync::Arc;

use logtap_protocol::StringifyOptions;
use serde_json::Value as Json;

use crate::error::StringifyError;
use crate::value::{ArrayValue, ErrorValue, ObjectValue, Value};

/// Appended to truncated text. Counts toward the length limit.
pub const TRUNCATION_MARKER: &str = "...";

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Renders `value` as text within the limits of `options`.
///
/// Never recurses past `depth_of_limit`, never walks more than
/// `num_of_keys_limit` keys of one composite, and never revisits an ancestor.
/// With a `string_length_limit` the result is at most that many characters.
pub fn stringify(value: &Value, options: &StringifyOptions) -> Result<String, StringifyError> {
    let text = match value {
        Value::Array(_) | Value::Object(_) => Walker::new(options).run(value)?,
        other => primitive_text(other),
    };

    Ok(truncate(text, options.string_length_limit))
}

/// Shortens `text` to at most `limit` characters, ending with
/// [`TRUNCATION_MARKER`] when the limit leaves room for it.
pub fn truncate(text: String, limit: Option<usize>) -> String {
    let Some(limit) = limit else {
        return text;
    };
    if text.chars().count() <= limit {
        return text;
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if limit < marker_len {
        return text.chars().take(limit).collect();
    }

    let mut out: String = text.chars().take(limit - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Why a walk ended before the whole value was written.
enum Halt {
    /// The output is already past the length limit.
    Full,
    Failed(StringifyError),
}

impl From<StringifyError> for Halt {
    fn from(e: StringifyError) -> Self {
        Halt::Failed(e)
    }
}

impl From<serde_json::Error> for Halt {
    fn from(e: serde_json::Error) -> Self {
        Halt::Failed(e.into())
    }
}

/// Depth-first writer holding the current ancestor path.
struct Walker<'a> {
    options: &'a StringifyOptions,
    /// `(identity, key used to reach it)` for every composite being rendered.
    path: Vec<(usize, String)>,
    out: String,
    /// Characters in `out`.
    written: usize,
}

impl<'a> Walker<'a> {
    fn new(options: &'a StringifyOptions) -> Self {
        Self {
            options,
            path: Vec::new(),
            out: String::new(),
            written: 0,
        }
    }

    /// Renders a composite root. A summarized root is returned bare.
    fn run(mut self, root: &Value) -> Result<String, StringifyError> {
        let summary = match root {
            Value::Array(array) if self.should_summarize(array.len()) => {
                Some(array_summary(array.len()))
            }
            Value::Object(object) if self.should_summarize(object.len()) => {
                Some(object_summary(object)?)
            }
            _ => None,
        };
        if let Some(summary) = summary {
            return Ok(summary);
        }

        match self.render(root, "") {
            Ok(()) | Err(Halt::Full) => Ok(self.out),
            Err(Halt::Failed(e)) => Err(e),
        }
    }

    fn write(&mut self, text: &str) -> Result<(), Halt> {
        self.out.push_str(text);
        self.written += text.chars().count();
        match self.options.string_length_limit {
            Some(limit) if self.written > limit => Err(Halt::Full),
            _ => Ok(()),
        }
    }

    /// Writes `text` as a JSON string literal.
    fn write_quoted(&mut self, text: &str) -> Result<(), Halt> {
        let quoted = serde_json::to_string(text)?;
        self.write(&quoted)
    }

    fn render(&mut self, value: &Value, key: &str) -> Result<(), Halt> {
        match value {
            Value::Undefined => self.write_quoted("undefined"),
            Value::Null => self.write("null"),
            Value::Bool(b) => self.write(if *b { "true" } else { "false" }),
            Value::Number(n) => self.write(&number_json(*n).to_string()),
            Value::String(s) => {
                let text = self.limit(s.clone());
                self.write_quoted(&text)
            }
            Value::BigInt(_) | Value::Function(_) | Value::Error(_) => {
                let text = self.limit(primitive_text(value));
                self.write_quoted(&text)
            }
            Value::Array(array) => self.render_array(array, key),
            Value::Object(object) => self.render_object(object, key),
        }
    }

    fn render_array(&mut self, array: &Arc<ArrayValue>, key: &str) -> Result<(), Halt> {
        let id = Arc::as_ptr(array) as usize;
        if let Some(marker) = self.circular_marker(id) {
            return self.write_quoted(&marker);
        }

        let items = array.items();
        if self.should_summarize(items.len()) {
            let summary = self.limit(array_summary(items.len()));
            return self.write_quoted(&summary);
        }

        self.path.push((id, key.to_string()));
        let result = self.render_items(&items);
        self.path.pop();
        result
    }

    fn render_items(&mut self, items: &[Value]) -> Result<(), Halt> {
        self.write("[")?;
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.write(",")?;
            }
            self.render(item, &index.to_string())?;
        }
        self.write("]")
    }

    fn render_object(&mut self, object: &Arc<ObjectValue>, key: &str) -> Result<(), Halt> {
        let id = Arc::as_ptr(object) as usize;
        if let Some(marker) = self.circular_marker(id) {
            return self.write_quoted(&marker);
        }

        // Only the key count is read before deciding to summarize.
        if self.should_summarize(object.len()) {
            let summary = self.limit(object_summary(object)?);
            return self.write_quoted(&summary);
        }

        self.path.push((id, key.to_string()));
        let result = self.render_entries(&object.entries());
        self.path.pop();
        result
    }

    fn render_entries(&mut self, entries: &[(String, Value)]) -> Result<(), Halt> {
        self.write("{")?;
        for (index, (key, value)) in entries.iter().enumerate() {
            if index > 0 {
                self.write(",")?;
            }
            self.write_quoted(key)?;
            self.write(":")?;
            self.render(value, key)?;
        }
        self.write("}")
    }

    fn should_summarize(&self, key_count: usize) -> bool {
        self.path.len() >= self.options.depth_of_limit || key_count > self.options.num_of_keys_limit
    }

    /// Marker for a composite already on the path, naming the keys that
    /// lead from the root to it.
    fn circular_marker(&self, id: usize) -> Option<String> {
        let position = self.path.iter().position(|(ancestor, _)| *ancestor == id)?;
        if position == 0 {
            return Some("[Circular ~]".to_string());
        }
        let keys: Vec<&str> = self.path[1..=position]
            .iter()
            .map(|(_, key)| key.as_str())
            .collect();
        Some(format!("[Circular ~.{}]", keys.join(".")))
    }

    fn limit(&self, text: String) -> String {
        truncate(text, self.options.string_length_limit)
    }
}

/// Natural text of a value that is not walked.
fn primitive_text(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(*n),
        Value::BigInt(n) => format!("{n}n"),
        Value::String(s) => s.clone(),
        Value::Function(name) => function_text(name),
        Value::Error(error) => error_text(error),
        Value::Array(array) => array_summary(array.len()),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn number_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == 0.0 {
        // Covers -0.
        "0".to_string()
    } else {
        n.to_string()
    }
}

fn number_json(n: f64) -> Json {
    if !n.is_finite() {
        return Json::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Json::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}

fn function_text(name: &str) -> String {
    if name.is_empty() {
        "function () { [native code] }".to_string()
    } else {
        format!("function {name}() {{ [native code] }}")
    }
}

fn error_text(error: &ErrorValue) -> String {
    match &error.stack {
        Some(stack) => format!("{error}\n{stack}\nEnd of stack for Error object"),
        None => format!("{}: {}", error.name, error.message),
    }
}

fn array_summary(len: usize) -> String {
    format!("Array({len})")
}

fn object_summary(object: &ObjectValue) -> Result<String, StringifyError> {
    match object.convert_to_text() {
        Some(Ok(text)) => Ok(text),
        Some(Err(e)) => Err(StringifyError::Conversion(e)),
        None => Ok("[object Object]".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(length: Option<usize>, keys: usize, depth: usize) -> StringifyOptions {
        StringifyOptions {
            string_length_limit: length,
            num_of_keys_limit: keys,
            depth_of_limit: depth,
        }
    }

    fn render(value: &Value) -> String {
        stringify(value, &StringifyOptions::default()).unwrap()
    }

    #[test]
    fn primitives_use_natural_text() {
        assert_eq!(render(&Value::from("plain text")), "plain text");
        assert_eq!(render(&Value::Undefined), "undefined");
        assert_eq!(render(&Value::Null), "null");
        assert_eq!(render(&Value::from(true)), "true");
        assert_eq!(render(&Value::from(42)), "42");
        assert_eq!(render(&Value::from(1.5)), "1.5");
        assert_eq!(render(&Value::Number(-0.0)), "0");
        assert_eq!(render(&Value::Number(f64::NAN)), "NaN");
        assert_eq!(render(&Value::Number(f64::NEG_INFINITY)), "-Infinity");
        assert_eq!(render(&Value::BigInt(12345678901234567890)), "12345678901234567890n");
        assert_eq!(
            render(&Value::Function("handler".into())),
            "function handler() { [native code] }"
        );
    }

    #[test]
    fn error_without_stack() {
        let error = Value::error(ErrorValue::new("TypeError", "x is undefined"));
        assert_eq!(render(&error), "TypeError: x is undefined");
    }

    #[test]
    fn error_with_stack() {
        let error = Value::error(ErrorValue::new("Error", "bad").with_stack("   0: main"));
        assert_eq!(
            render(&error),
            "Error: bad\n   0: main\nEnd of stack for Error object"
        );
    }

    #[test]
    fn composites_render_as_json() {
        let value = Value::object([
            ("name", Value::from("capy")),
            ("age", Value::from(3)),
            ("tags", Value::array([Value::from("a"), Value::Null])),
            ("missing", Value::Undefined),
            ("ratio", Value::from(0.25)),
            ("inf", Value::Number(f64::INFINITY)),
        ]);
        assert_eq!(
            render(&value),
            r#"{"name":"capy","age":3,"tags":["a",null],"missing":"undefined","ratio":0.25,"inf":null}"#
        );
    }

    #[test]
    fn text_truncated_with_marker() {
        let opts = options(Some(8), 50, 4);
        let out = stringify(&Value::from("abcdefghijkl"), &opts).unwrap();
        assert_eq!(out, "abcde...");
        assert_eq!(out.chars().count(), 8);
    }

    #[test]
    fn text_at_limit_untouched() {
        let opts = options(Some(5), 50, 4);
        assert_eq!(stringify(&Value::from("abcde"), &opts).unwrap(), "abcde");
    }

    #[test]
    fn tiny_limit_truncates_without_marker() {
        let opts = options(Some(2), 50, 4);
        assert_eq!(stringify(&Value::from("abcdef"), &opts).unwrap(), "ab");
        let opts = options(Some(0), 50, 4);
        assert_eq!(stringify(&Value::from("abcdef"), &opts).unwrap(), "");
    }

    #[test]
    fn truncation_counts_characters() {
        let opts = options(Some(4), 50, 4);
        assert_eq!(stringify(&Value::from("ñañañaña"), &opts).unwrap(), "ñ...");
    }

    #[test]
    fn nested_text_is_truncated() {
        let opts = options(Some(6), 50, 4);
        let value = Value::array([Value::from("abcdefghij")]);
        // The inner string is cut first, then the whole rendering.
        assert_eq!(stringify(&value, &opts).unwrap(), "[\"a...");

        let roomy = StringifyOptions {
            string_length_limit: Some(12),
            ..opts
        };
        assert_eq!(stringify(&value, &roomy).unwrap(), "[\"abcdefg...");
    }

    #[test]
    fn composite_output_respects_length_limit() {
        let opts = options(Some(10), 50, 4);
        let value = Value::object([("key", Value::from("value")), ("other", Value::from(1))]);
        let out = stringify(&value, &opts).unwrap();
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn self_reference_marks_root() {
        let object = Arc::new(ObjectValue::new());
        object.insert("name", Value::from("loop"));
        object.insert("self", Value::Object(Arc::clone(&object)));

        let out = render(&Value::Object(object));
        assert_eq!(out, r#"{"name":"loop","self":"[Circular ~]"}"#);
    }

    #[test]
    fn deep_cycle_names_path() {
        let root = Arc::new(ObjectValue::new());
        let child = Arc::new(ObjectValue::new());
        let grandchild = Arc::new(ObjectValue::new());
        root.insert("a", Value::Object(Arc::clone(&child)));
        child.insert("b", Value::Object(Arc::clone(&grandchild)));
        grandchild.insert("back", Value::Object(Arc::clone(&child)));

        let out = render(&Value::Object(root));
        assert_eq!(out, r#"{"a":{"b":{"back":"[Circular ~.a]"}}}"#);
    }

    #[test]
    fn array_cycle() {
        let array = Arc::new(ArrayValue::new([Value::from(1)]));
        array.push(Value::Array(Arc::clone(&array)));
        assert_eq!(render(&Value::Array(array)), r#"[1,"[Circular ~]"]"#);
    }

    #[test]
    fn shared_siblings_are_not_cycles() {
        let shared = Value::object([("x", Value::from(1))]);
        let value = Value::array([shared.clone(), shared]);
        assert_eq!(render(&value), r#"[{"x":1},{"x":1}]"#);
    }

    #[test]
    fn cyclic_graph_respects_length_limit() {
        let object = Arc::new(ObjectValue::new());
        for i in 0..10 {
            object.insert(format!("k{i}"), Value::Object(Arc::clone(&object)));
        }
        let opts = options(Some(40), 50, 4);
        let out = stringify(&Value::Object(object), &opts).unwrap();
        assert!(out.chars().count() <= 40);
    }

    #[test]
    fn key_limit_skips_traversal() {
        let object = ObjectValue::with_conversion(|| Ok("Big{…}".into()));
        for i in 0..4 {
            // Would fail if visited.
            let poisoned = ObjectValue::with_conversion(|| Err("visited".into()));
            object.insert(format!("k{i}"), Value::Object(Arc::new(poisoned)));
        }
        let opts = options(None, 3, 4);
        assert_eq!(stringify(&Value::Object(Arc::new(object)), &opts).unwrap(), "Big{…}");
    }

    #[test]
    fn key_limit_plain_object_fallback() {
        let value = Value::object((0..5).map(|i| (format!("k{i}"), Value::from(i))));
        let opts = options(None, 4, 4);
        assert_eq!(stringify(&value, &opts).unwrap(), "[object Object]");

        let opts = options(None, 5, 4);
        assert_eq!(
            stringify(&value, &opts).unwrap(),
            r#"{"k0":0,"k1":1,"k2":2,"k3":3,"k4":4}"#
        );
    }

    #[test]
    fn key_limit_applies_to_arrays() {
        let value = Value::array((0..4).map(Value::from));
        let opts = options(None, 3, 4);
        assert_eq!(stringify(&value, &opts).unwrap(), "Array(4)");
    }

    #[test]
    fn depth_limit_summarizes_level_d_node() {
        let level2 = Value::Object(Arc::new(ObjectValue::with_conversion(|| {
            Ok("<level 2>".into())
        })));
        if let Value::Object(object) = &level2 {
            object.insert("deeper", Value::object([("x", Value::from(1))]));
        }
        let level1 = Value::object([("c", level2)]);
        let root = Value::object([("b", level1)]);

        let opts = options(None, 50, 2);
        assert_eq!(stringify(&root, &opts).unwrap(), r#"{"b":{"c":"<level 2>"}}"#);

        let opts = options(None, 50, 1);
        assert_eq!(stringify(&root, &opts).unwrap(), r#"{"b":"[object Object]"}"#);
    }

    #[test]
    fn zero_depth_summarizes_root() {
        let value = Value::array([Value::from(1)]);
        let opts = options(None, 50, 0);
        assert_eq!(stringify(&value, &opts).unwrap(), "Array(1)");
    }

    #[test]
    fn failing_conversion_is_an_error() {
        let object = ObjectValue::with_conversion(|| Err("toString exploded".into()));
        let opts = options(None, 50, 0);
        let err = stringify(&Value::Object(Arc::new(object)), &opts).unwrap_err();
        assert!(matches!(err, StringifyError::Conversion(ref m) if m == "toString exploded"));
    }

    #[test]
    fn failing_conversion_nested() {
        let bad = Value::Object(Arc::new(ObjectValue::with_conversion(|| {
            Err("nope".into())
        })));
        let value = Value::object([("bad", bad)]);
        let opts = options(None, 50, 1);
        assert!(stringify(&value, &opts).is_err());
    }

    #[test]
    fn wide_shared_graph_stops_at_length_limit() {
        // Every key points at the same child: 50^6 leaves if fully walked.
        let mut value = Value::from("leaf");
        for _ in 0..6 {
            let child = value;
            value = Value::object((0..50).map(|i| (format!("k{i}"), child.clone())));
        }
        let opts = options(Some(100), 50, 10);
        let out = stringify(&value, &opts).unwrap();

        assert_eq!(out.chars().count(), 100);
        assert!(out.starts_with(r#"{"k0":{"k0":{"k0":{"k0":{"k0":{"k0":"leaf","k1":"leaf""#));
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn conversion_past_length_limit_is_not_reached() {
        let bad = Value::Object(Arc::new(ObjectValue::with_conversion(|| {
            Err("nope".into())
        })));
        let value = Value::array([Value::from("long enough to fill"), bad]);
        let opts = options(Some(10), 50, 1);
        assert_eq!(stringify(&value, &opts).unwrap(), "[\"long ...");
    }

    #[test]
    fn wide_and_deep_input_terminates() {
        let mut value = Value::from("leaf");
        for _ in 0..500 {
            value = Value::array([value]);
        }
        let opts = options(Some(64), 50, 4);
        let out = stringify(&value, &opts).unwrap();
        assert_eq!(out, r#"[[[["Array(1)"]]]]"#);
    }
}
