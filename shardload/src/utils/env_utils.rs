#[derive(Copy, Clone, Debug)]
pub enum LoaderEnvVar {
    ChunkSize,
    Log,
}

impl LoaderEnvVar {
    pub fn key(&self) -> &'static str {
        match self {
            LoaderEnvVar::ChunkSize => "SHARDLOAD_CHUNK_SIZE",
            LoaderEnvVar::Log => "SHARDLOAD_LOG",
        }
    }

    pub fn value(&self) -> String {
        std::env::var(self.key()).unwrap_or_default()
    }

    /// The value, or `None` when the variable is unset or blank.
    pub fn non_empty_value(&self) -> Option<String> {
        let value = self.value();
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(LoaderEnvVar::ChunkSize.key(), "SHARDLOAD_CHUNK_SIZE");
        assert_eq!(LoaderEnvVar::Log.key(), "SHARDLOAD_LOG");
    }
}
