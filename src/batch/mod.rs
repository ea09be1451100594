//! Compressed NDJSON batches and the weighted combiner that re-samples them.

pub mod codec;
pub mod weighted;

pub use codec::{
    CompressedBatch, compress_json_lines, compress_values, decompress_batch, decompress_batches,
    decompress_to_json_lines, json_lines_to_values, to_json_lines,
    write_compressed_batch_to_array_file, write_compressed_values_to_array_file,
    write_multiple_compressed_batches_to_array_file,
};
pub use weighted::{
    WeightedGroup, parse_weighted_groups, resample, write_weighted_batches_to_array_file,
};
