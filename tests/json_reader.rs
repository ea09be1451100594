use anyhow::Result;
use datastrand::io::json::{
    JsonDocument, JsonFormat, detect_json_format, for_each_json_value, is_json_lines_path,
    load_json, read_json,
};
use datastrand::testing::*;
use datastrand::Error;
use serde_json::json;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[test]
fn detects_format_from_first_significant_byte() -> Result<()> {
    let cases = [
        ("  \n\t[1]", JsonFormat::Array),
        ("\r\n{\"a\":1}", JsonFormat::Object),
        ("\"x\"\n", JsonFormat::Lines),
        ("", JsonFormat::Lines),
    ];
    for (text, expected) in cases {
        let mut reader = BufReader::new(text.as_bytes());
        assert_eq!(detect_json_format(&mut reader, None)?, expected, "{text:?}");
    }

    // The significant byte is left for the parser.
    let mut reader = BufReader::new("   [1,2]".as_bytes());
    detect_json_format(&mut reader, None)?;
    let mut rest = String::new();
    reader.read_to_string(&mut rest)?;
    assert_eq!(rest, "[1,2]");
    Ok(())
}

#[test]
fn ndjson_file_names_force_line_parsing() -> Result<()> {
    assert!(is_json_lines_path("events.ndjson"));
    assert!(is_json_lines_path("EVENTS.JSONL"));
    assert!(is_json_lines_path("dir/events.jsonl.gz"));
    assert!(!is_json_lines_path("events.json"));

    let mut reader = BufReader::new("[1]".as_bytes());
    let format = detect_json_format(&mut reader, Some(Path::new("x.jsonl")))?;
    assert_eq!(format, JsonFormat::Lines);
    Ok(())
}

#[test]
fn reads_top_level_array() -> Result<()> {
    let doc = read_json(r#" [{"a":1}, {"a":2}, 3] "#.as_bytes(), None)?;
    assert_eq!(
        doc,
        JsonDocument::Values(vec![json!({"a": 1}), json!({"a": 2}), json!(3)])
    );
    Ok(())
}

#[test]
fn reads_top_level_object_as_a_mapping() -> Result<()> {
    let doc = read_json(r#"{"x": {"y": 1}, "z": [2]}"#.as_bytes(), None)?;
    let object = doc.as_object().expect("object document");
    assert_eq!(object.len(), 2);
    assert_eq!(object["x"], json!({"y": 1}));
    assert!(doc.as_values().is_none());
    Ok(())
}

#[test]
fn reads_ndjson_skipping_blank_lines() -> Result<()> {
    let text = "{\"a\":1}\n\n   \n{\"a\":2}\n";
    let doc = read_json(text.as_bytes(), Some(Path::new("in.ndjson")))?;
    assert_eq!(doc.as_values(), Some(&[json!({"a": 1}), json!({"a": 2})][..]));
    Ok(())
}

#[test]
fn ndjson_errors_carry_the_line_number() {
    let text = "{\"a\":1}\n\n{\"a\":\n";
    let err = read_json(text.as_bytes(), Some(Path::new("in.jsonl"))).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert_eq!(err.line(), Some(3));

    let err = read_json("{\"a\":1}\n[1,2]\n".as_bytes(), Some(Path::new("in.jsonl"))).unwrap_err();
    assert_eq!(err.line(), Some(2));
}

#[test]
fn ndjson_without_a_hint_is_read_as_one_object_and_rejected() {
    let err = read_json("{\"a\":1}\n{\"a\":2}\n".as_bytes(), None).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
}

#[test]
fn malformed_arrays_are_parse_errors() {
    for text in ["[1, 2", "[1,, 2]", "[1] x", "[1]]"] {
        let err = read_json(text.as_bytes(), None).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{text}: {err}");
    }
}

#[test]
fn empty_and_whitespace_sources_are_empty() -> Result<()> {
    for text in ["", " \n\n "] {
        let doc = read_json(text.as_bytes(), None)?;
        assert!(doc.is_empty());
        assert!(doc.as_values().is_some());
    }
    Ok(())
}

#[test]
fn for_each_json_value_streams_array_elements() -> Result<()> {
    let text = format!(
        "[{}]",
        (0..2500).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    );
    let mut reader = BufReader::new(text.as_bytes());
    let format = detect_json_format(&mut reader, None)?;

    let mut sum = 0u64;
    let n = for_each_json_value(&mut reader, format, "numbers", |v| {
        sum += v.as_u64().unwrap_or_default();
        Ok(())
    })?;
    assert_eq!(n, 2500);
    assert_eq!(sum, (0..2500u64).sum::<u64>());
    assert!(reader.fill_buf()?.is_empty());
    Ok(())
}

#[test]
fn callback_errors_stop_the_stream() {
    let mut seen = 0;
    let err = for_each_json_value("[1,2,3]".as_bytes(), JsonFormat::Array, "x", |_| {
        seen += 1;
        if seen == 2 {
            Err(Error::Config("stop".into()))
        } else {
            Ok(())
        }
    })
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(seen, 2);
}

#[test]
fn load_json_from_plain_and_gzip_files() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let people = sample_people_values();

    let array = write_json_array_file(tmp.path(), "people.json", &people)?;
    assert_eq!(load_json(&array)?, JsonDocument::Values(people.clone()));

    let lines: Vec<String> = people.iter().map(|p| p.to_string()).collect();
    let gz = write_gzip_file(tmp.path(), "people.jsonl.gz", &lines.join("\n"))?;
    assert_eq!(load_json(&gz)?, JsonDocument::Values(people));
    Ok(())
}

#[test]
fn load_json_missing_file_is_io_error() {
    let err = load_json("missing/file.json").unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err}");
}

#[test]
fn ndjson_invalid_utf8_is_a_parse_error_with_its_line() {
    let bytes: &[u8] = b"{\"a\":1}\n{\"a\":\"\xff\"}\n";
    let err = read_json(bytes, Some(Path::new("x.ndjson"))).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
    assert_eq!(err.line(), Some(2));
}
