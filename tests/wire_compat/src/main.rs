fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use logtap_protocol::{LogRecord, Method, RecordKind, StackFrame, StringifyOptions};
    use logtap_stringify::{Value, stringify};
    use serde::Deserialize;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    // --- Record tests ---

    #[test]
    fn fixture_log_record() {
        let record: LogRecord = roundtrip_test("log_record.json");
        assert_eq!(record.kind, RecordKind::Level(Method::Log));
        let trace = record.trace.unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[1].file_name, None);
    }

    #[test]
    fn fixture_threshold_record() {
        let record: LogRecord = roundtrip_test("threshold_record.json");
        assert_eq!(record.kind, RecordKind::Warn);
        assert!(record.trace.is_none());
        assert_eq!(record.value, LogRecord::threshold_notice().value);
    }

    #[test]
    fn fixture_error_record() {
        let record: LogRecord = roundtrip_test("error_record.json");
        assert_eq!(record.kind, RecordKind::Error);
        assert_eq!(record.trace, Some(Vec::new()));
    }

    #[test]
    fn fixture_group_collapsed_record() {
        let record: LogRecord = roundtrip_test("group_collapsed_record.json");
        assert_eq!(record.kind, RecordKind::Level(Method::GroupCollapsed));
        assert_eq!(
            record.trace.unwrap(),
            vec![StackFrame {
                file_name: Some("<anonymous>".into()),
                ..StackFrame::default()
            }]
        );
    }

    #[test]
    fn fixture_stringify_options() {
        let options: StringifyOptions = roundtrip_test("stringify_options.json");
        assert_eq!(options.string_length_limit, Some(2000));
    }

    #[test]
    fn unknown_record_type_is_rejected() {
        let mut fixture = load_fixture("error_record.json");
        fixture["type"] = serde_json::json!("shout");
        assert!(serde_json::from_value::<LogRecord>(fixture).is_err());
    }

    // --- Stringify output tests ---

    #[derive(Deserialize)]
    struct StringifyCase {
        name: String,
        input: serde_json::Value,
        #[serde(default)]
        options: StringifyOptions,
        expected: String,
    }

    fn to_value(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(to_value)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, to_value(v))))
            }
        }
    }

    #[test]
    fn fixture_stringify_cases() {
        let cases: Vec<StringifyCase> = serde_json::from_value(load_fixture("stringify_cases.json"))
            .unwrap_or_else(|e| panic!("failed to parse stringify cases: {e}"));
        assert!(!cases.is_empty());

        for case in cases {
            let out = stringify(&to_value(case.input), &case.options)
                .unwrap_or_else(|e| panic!("{}: stringify failed: {e}", case.name));
            assert_eq!(out, case.expected, "case: {}", case.name);
        }
    }
}
