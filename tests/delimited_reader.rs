use anyhow::Result;
use datastrand::testing::*;
use datastrand::{
    DelimitedReader, Error, ReaderOptions, Row, read_delimited_file, write_delimited_file,
};

fn read_all(input: &str, options: ReaderOptions) -> datastrand::Result<Vec<Row>> {
    DelimitedReader::new(input.as_bytes(), options)?.collect()
}

fn row(fields: &[&str]) -> Row {
    fields.iter().map(|s| s.to_string()).collect()
}

fn strict() -> ReaderOptions {
    ReaderOptions::default().with_lazy_quotes(false)
}

#[test]
fn quoted_fields_hold_delimiters_and_doubled_quotes() -> Result<()> {
    let rows = read_all("1,\"hello, \"\"world\"\"\",x\n", strict())?;
    assert_eq!(rows, vec![row(&["1", "hello, \"world\"", "x"])]);
    Ok(())
}

#[test]
fn quoted_field_spans_lines() -> Result<()> {
    let input = "id,text\n1,\"line one\nline two\"\n2,plain\n";
    let mut reader = DelimitedReader::new(input.as_bytes(), strict())?;
    let rows: Vec<Row> = reader.by_ref().collect::<datastrand::Result<_>>()?;
    assert_eq!(
        rows,
        vec![
            row(&["id", "text"]),
            row(&["1", "line one\nline two"]),
            row(&["2", "plain"]),
        ]
    );
    assert_eq!(reader.line_number(), 4);
    assert_eq!(reader.records_read(), 3);
    Ok(())
}

#[test]
fn crlf_is_read_as_lf() -> Result<()> {
    let rows = read_all("a,b\r\n1,\"x\r\ny\"\r\n", strict())?;
    assert_eq!(rows, vec![row(&["a", "b"]), row(&["1", "x\ny"])]);
    Ok(())
}

#[test]
fn bare_quote_is_literal_when_lazy_and_an_error_when_strict() -> Result<()> {
    let lazy = read_all("a,b\"c,d\n", ReaderOptions::default())?;
    assert_eq!(lazy, vec![row(&["a", "b\"c", "d"])]);

    let err = read_all("a,b\"c,d\n", strict()).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert_eq!(err.line(), Some(1));
    assert!(err.to_string().contains("bare quote"), "{err}");
    Ok(())
}

#[test]
fn stray_quote_in_quoted_field_reports_its_line() -> Result<()> {
    let mut reader = DelimitedReader::new("x,y\n\"ab\"c,d\n".as_bytes(), strict())?;
    assert_eq!(reader.next().transpose()?, Some(row(&["x", "y"])));

    let err = reader.next().transpose().unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert!(err.to_string().contains("extraneous or missing quote"), "{err}");
    // The sequence ends after the first error.
    assert!(reader.next().is_none());
    Ok(())
}

#[test]
fn unterminated_quote_at_end_of_input() -> Result<()> {
    let err = read_all("1,\"abc\n", strict()).unwrap_err();
    assert_eq!(err.line(), Some(1));

    let lazy = read_all("1,\"abc\n", ReaderOptions::default())?;
    assert_eq!(lazy, vec![row(&["1", "abc\n"])]);
    Ok(())
}

#[test]
fn leading_space_is_trimmed_before_quote_detection() -> Result<()> {
    let rows = read_all("a,  \"b,c\",d\n", strict())?;
    assert_eq!(rows, vec![row(&["a", "b,c", "d"])]);

    let untrimmed = read_all("a, b\n", ReaderOptions::default().with_trim_leading_space(false))?;
    assert_eq!(untrimmed, vec![row(&["a", " b"])]);
    Ok(())
}

#[test]
fn trim_space_strips_both_ends() -> Result<()> {
    let options = ReaderOptions::default()
        .with_trim_leading_space(false)
        .with_trim_space(true);
    let rows = read_all(" a , b \t\n", options)?;
    assert_eq!(rows, vec![row(&["a", "b"])]);
    Ok(())
}

#[test]
fn blank_lines_are_skipped_and_arity_is_free() -> Result<()> {
    let rows = read_all("a\n\n\nb,c,d\n\ne,f", ReaderOptions::default())?;
    assert_eq!(rows, vec![row(&["a"]), row(&["b", "c", "d"]), row(&["e", "f"])]);
    Ok(())
}

#[test]
fn empty_fields_are_kept() -> Result<()> {
    let rows = read_all(",,\n5,,500\n", ReaderOptions::default())?;
    assert_eq!(rows, vec![row(&["", "", ""]), row(&["5", "", "500"])]);
    Ok(())
}

#[test]
fn custom_delimiter_and_rejected_delimiters() -> Result<()> {
    let rows = read_all("a\tb;c\n", ReaderOptions::default().with_delimiter('\t'))?;
    assert_eq!(rows, vec![row(&["a", "b;c"])]);

    for bad in ['"', '\n', '\r', 'é'] {
        let err = DelimitedReader::new("".as_bytes(), ReaderOptions::default().with_delimiter(bad))
            .err()
            .expect("delimiter should be rejected");
        assert!(matches!(err, Error::Config(_)), "{bad:?}: {err}");
    }
    Ok(())
}

#[test]
fn reader_options_from_json_use_defaults_for_missing_keys() -> Result<()> {
    let options: ReaderOptions = serde_json::from_str(r#"{"lazyQuotes": false}"#)?;
    assert!(!options.lazy_quotes);
    assert!(options.trim_leading_space);
    assert!(!options.trim_space);
    assert_eq!(options.delimiter, ',');
    Ok(())
}

#[test]
fn write_then_read_file_roundtrip() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("nested/out.csv");
    let rows = vec![
        row(&["id", "note"]),
        row(&["1", "a,b"]),
        row(&["2", "say \"hi\""]),
        row(&["3", "multi\nline", "extra"]),
    ];

    assert_eq!(write_delimited_file(&path, &rows)?, 4);
    let back = read_delimited_file(&path, &strict())?;
    assert_eq!(back, rows);
    Ok(())
}

#[test]
fn gzip_input_is_decoded_transparently() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let by_ext = write_gzip_file(tmp.path(), "sample.csv.gz", SAMPLE_CSV)?;
    let by_magic = write_gzip_file(tmp.path(), "sample.bin", SAMPLE_CSV)?;

    let expected = sample_rows();
    assert_eq!(read_delimited_file(by_ext, &ReaderOptions::default())?, expected);
    assert_eq!(read_delimited_file(by_magic, &ReaderOptions::default())?, expected);
    Ok(())
}

#[test]
fn missing_file_is_an_io_error_naming_the_path() {
    let err = read_delimited_file("no/such/file.csv", &ReaderOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("no/such/file.csv"), "{err}");
}
