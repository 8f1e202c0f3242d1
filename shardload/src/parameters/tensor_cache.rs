use std::collections::HashMap;

/// Name-addressed staging area for tensors parsed from shards.
#[derive(Debug)]
pub struct NamedTensorCache<A> {
    tensors: HashMap<String, A>,
}

impl<A> Default for NamedTensorCache<A> {
    fn default() -> Self {
        Self {
            tensors: HashMap::new(),
        }
    }
}

impl<A> NamedTensorCache<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are write-once; a repeated name means the same parameter was
    /// parsed twice, which the shard metadata rules out.
    pub fn insert(
        &mut self,
        name: String,
        tensor: A,
    ) {
        let previous = self.tensors.insert(name, tensor);
        assert!(
            previous.is_none(),
            "parameter cache entry written twice"
        );
    }

    pub fn extend(
        &mut self,
        tensors: impl IntoIterator<Item = (String, A)>,
    ) {
        for (name, tensor) in tensors {
            self.insert(name, tensor);
        }
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&A> {
        self.tensors.get(name)
    }

    pub fn take(
        &mut self,
        name: &str,
    ) -> Option<A> {
        self.tensors.remove(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Drops every entry and releases the backing allocation.
    pub fn clear(&mut self) {
        self.tensors = HashMap::new();
    }
}
