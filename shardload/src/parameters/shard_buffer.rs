use std::path::Path;

use super::ShardParseError;

/// Largest up-front reservation made from a shard's declared size.
const MAX_RESERVATION: usize = 1 << 30;

/// Extracts the shard index from a shard file name: the trailing decimal
/// digits of the file stem, e.g. `params_shard_12.bin` -> 12.
pub fn shard_index_from_filename(
    filename: &str
) -> Result<usize, ShardParseError> {
    let malformed = || ShardParseError::MalformedFilename(filename.to_string());
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(malformed)?;
    let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &stem[prefix.len()..];
    if digits.is_empty() {
        return Err(malformed());
    }
    digits.parse().map_err(|_| malformed())
}

/// Bytes of one shard file received so far.
#[derive(Debug)]
pub struct ShardBuffer {
    filename: String,
    shard_index: usize,
    bytes: Vec<u8>,
}

impl ShardBuffer {
    pub fn new(
        filename: impl Into<String>,
        shard_index: usize,
        expected_size: Option<usize>,
    ) -> Self {
        let capacity = expected_size.unwrap_or(0).min(MAX_RESERVATION);
        Self {
            filename: filename.into(),
            shard_index,
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn shard_index(&self) -> usize {
        self.shard_index
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn append(
        &mut self,
        chunk: &[u8],
    ) {
        self.bytes.extend_from_slice(chunk);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Drops the received bytes together with their allocation.
    pub fn release(&mut self) {
        self.bytes = Vec::new();
    }
}
