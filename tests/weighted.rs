use anyhow::Result;
use datastrand::batch::{parse_weighted_groups, resample};
use datastrand::testing::*;
use datastrand::{
    CompressedBatch, DecodeStage, Error, WeightedGroup, WriterOptions, compress_values,
    write_weighted_batches_to_array_file,
};
use serde_json::{Value, json};
use std::path::Path;

fn person(name: &str) -> Value {
    json!({ "name": name })
}

fn batch(names: &[&str]) -> CompressedBatch {
    let values: Vec<Value> = names.iter().map(|n| person(n)).collect();
    compress_values(&values, None).expect("compress")
}

fn names(path: &Path) -> Result<Vec<String>> {
    Ok(read_json_array_file(path)?
        .into_iter()
        .map(|v| v["name"].as_str().unwrap_or_default().to_string())
        .collect())
}

fn write(groups: &[WeightedGroup], path: &Path) -> datastrand::Result<usize> {
    write_weighted_batches_to_array_file(groups, path, &WriterOptions::default())
}

#[test]
fn resample_truncates_or_cycles() {
    let input = [1, 2, 3];
    for n in 1..=input.len() {
        for target in 0..12 {
            let out = resample(&input[..n], target);
            assert_eq!(out.len(), target);
            for (i, v) in out.iter().enumerate() {
                assert_eq!(*v, input[i % n]);
            }
        }
    }
    assert!(resample::<i32>(&[], 5).is_empty());
}

#[test]
fn equal_target_keeps_everything() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let out = tmp.file_path("equal.json");
    let n = write(&[WeightedGroup::new(vec![batch(&["Alice", "Bob"])], 2)], &out)?;
    assert_eq!(n, 2);
    assert_eq!(names(&out)?, ["Alice", "Bob"]);
    Ok(())
}

#[test]
fn larger_group_is_truncated_to_its_first_records() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let out = tmp.file_path("truncated.json");
    let group = WeightedGroup::new(vec![batch(&["Charlie", "Diana", "Eve", "Frank", "Grace"])], 3);
    assert_eq!(write(&[group], &out)?, 3);
    assert_eq!(names(&out)?, ["Charlie", "Diana", "Eve"]);
    Ok(())
}

#[test]
fn smaller_group_is_repeated_cyclically() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let out = tmp.file_path("cycled.json");
    assert_eq!(write(&[WeightedGroup::new(vec![batch(&["Henry"])], 4)], &out)?, 4);
    assert_eq!(names(&out)?, ["Henry"; 4]);

    assert_eq!(write(&[WeightedGroup::new(vec![batch(&["Alice", "Bob"])], 5)], &out)?, 5);
    assert_eq!(names(&out)?, ["Alice", "Bob", "Alice", "Bob", "Alice"]);
    Ok(())
}

#[test]
fn batches_in_a_group_are_concatenated_before_resampling() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let out = tmp.file_path("concat.json");
    let group = WeightedGroup::new(
        vec![batch(&["Alice", "Bob"]), CompressedBatch::default(), batch(&["Henry"])],
        4,
    );
    assert_eq!(write(&[group], &out)?, 4);
    assert_eq!(names(&out)?, ["Alice", "Bob", "Henry", "Alice"]);
    Ok(())
}

#[test]
fn groups_are_written_in_input_order() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let out = tmp.file_path("multi.json");
    let groups = [
        WeightedGroup::new(vec![batch(&["Alice", "Bob"])], 1),
        WeightedGroup::new(vec![batch(&["Henry"])], 2),
        WeightedGroup::new(vec![batch(&["Charlie", "Diana"])], 3),
    ];
    assert_eq!(write(&groups, &out)?, 6);
    assert_eq!(
        names(&out)?,
        ["Alice", "Henry", "Henry", "Charlie", "Diana", "Charlie"]
    );
    Ok(())
}

#[test]
fn empty_input_and_empty_groups_write_an_empty_array() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let out = tmp.file_path("empty.json");
    assert_eq!(write(&[], &out)?, 0);
    assert_eq!(std::fs::read_to_string(&out)?, "[]");

    let no_records = WeightedGroup::new(vec![compress_values::<Value>(&[], None)?], 3);
    assert_eq!(write(&[no_records], &out)?, 0);
    Ok(())
}

#[test]
fn loose_entries_parse_with_float_zero_and_negative_weights() -> Result<()> {
    let b1 = batch(&["Alice", "Bob"]);
    let b3 = batch(&["Henry"]);
    let groups = parse_weighted_groups(&json!([
        [[b1.as_str()], 0],
        [[b1.as_str()], -2],
        [[b3.as_str()], 2],
        [[b1.as_str()], 3.0],
        [[b1.as_str()], 1.9]
    ]))?;
    let targets: Vec<usize> = groups.iter().map(|g| g.target).collect();
    assert_eq!(targets, [0, 0, 2, 3, 1]);

    let tmp = TempDirPath::new()?;
    let out = tmp.file_path("parsed.json");
    assert_eq!(write(&groups, &out)?, 6);
    assert_eq!(
        names(&out)?,
        ["Henry", "Henry", "Alice", "Bob", "Alice", "Alice"]
    );
    Ok(())
}

#[test]
fn malformed_entries_are_config_errors() {
    let b = batch(&["Alice"]);
    let missing_weight = parse_weighted_groups(&json!([[[b.as_str()]]])).unwrap_err();
    assert!(matches!(missing_weight, Error::Config(_)));
    assert!(
        missing_weight
            .to_string()
            .contains("expected [multipleCompressedJsonLines, weight]"),
        "{missing_weight}"
    );

    let bad_weight = parse_weighted_groups(&json!([[[b.as_str()], "invalid"]])).unwrap_err();
    assert!(bad_weight.to_string().contains("expected number"), "{bad_weight}");

    let bad_batches = parse_weighted_groups(&json!([[[1, 2], 1]])).unwrap_err();
    assert!(matches!(bad_batches, Error::Config(_)));

    assert!(parse_weighted_groups(&json!({"not": "a list"})).is_err());
}

#[test]
fn undecodable_batch_names_group_and_batch() -> Result<()> {
    let tmp = TempDirPath::new()?;
    let groups = [
        WeightedGroup::new(vec![batch(&["Alice"])], 1),
        WeightedGroup::new(
            vec![batch(&["Bob"]), CompressedBatch::from_envelope("invalid-base64-data!!!")],
            2,
        ),
    ];
    let err = write(&groups, &tmp.file_path("bad.json")).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Envelope));
    assert!(err.to_string().contains("group 2 batch 2"), "{err}");
    Ok(())
}
