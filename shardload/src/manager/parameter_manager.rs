use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info, warn};

use super::{Ingested, LoadState, read_metadata};
use crate::{
    DeviceContext,
    parameters::{
        MetadataSource, NamedTensorCache, ParameterError, ParameterStore,
        ShardBuffer, ShardMetadata, ShardParser, materialize, resolve_shard,
    },
    training::{GradientResult, TrainStep},
};

/// Drives shard ingestion for one model: buffers chunks per shard file,
/// parses completed shards into the tensor cache and materializes the
/// parameter store once the last shard arrives.
pub struct ParameterManager<C: DeviceContext> {
    context: C,
    metadata: ShardMetadata,
    parameter_order: Box<[String]>,
    buffers: HashMap<String, ShardBuffer>,
    completed_files: HashSet<String>,
    completed_shards: HashSet<usize>,
    parser: ShardParser,
    cache: NamedTensorCache<C::DeviceArray>,
    store: Option<ParameterStore<C::DeviceArray>>,
    state: LoadState,
}

impl<C: DeviceContext> ParameterManager<C> {
    pub fn new(
        context: C,
        source: &impl MetadataSource,
    ) -> Result<Self, ParameterError> {
        let (metadata, parameter_order) = read_metadata(source)?;
        let total_shards = metadata.total_shard_count();
        info!(
            shards = total_shards,
            parameters = parameter_order.len(),
            "parameter manager created"
        );
        Ok(Self {
            context,
            metadata,
            parameter_order,
            buffers: HashMap::new(),
            completed_files: HashSet::new(),
            completed_shards: HashSet::new(),
            parser: ShardParser::new(),
            cache: NamedTensorCache::new(),
            store: None,
            state: LoadState::Loading {
                pending: total_shards,
            },
        })
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn metadata(&self) -> &ShardMetadata {
        &self.metadata
    }

    pub fn declared_parameter_order(&self) -> &[String] {
        &self.parameter_order
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn total_shards(&self) -> usize {
        self.metadata.total_shard_count()
    }

    /// Shard files not yet fully ingested.
    pub fn pending_shards(&self) -> usize {
        match self.state {
            LoadState::Loading {
                pending,
            } => pending,
            LoadState::AllShardsIngested
            | LoadState::Materialized
            | LoadState::Failed => 0,
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.state == LoadState::Materialized
    }

    /// Files with buffered but unfinished content.
    pub fn files_in_progress(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    /// Appends a chunk to the shard file `filename`. The final chunk of a
    /// file parses it into the cache; the final chunk of the last file
    /// materializes the parameter store.
    pub fn ingest_chunk(
        &mut self,
        filename: &str,
        bytes: &[u8],
        is_final_chunk: bool,
    ) -> Result<Ingested, ParameterError> {
        self.ensure_loading()?;
        if self.completed_files.contains(filename) {
            return Err(ParameterError::DuplicateCompletion {
                filename: filename.to_string(),
            });
        }

        let (key, mut buffer) = match self.buffers.remove_entry(filename) {
            Some(entry) => entry,
            None => (filename.to_string(), self.open_buffer(filename)?),
        };
        buffer.append(bytes);
        debug!(
            file = filename,
            chunk = bytes.len(),
            received = buffer.len(),
            is_final_chunk,
            "received shard chunk"
        );

        if !is_final_chunk {
            let received = buffer.len();
            self.buffers.insert(key, buffer);
            return Ok(Ingested::Buffered {
                received,
            });
        }

        self.complete_shard(key, buffer)
    }

    /// Drops partially received content of `filename` so it can be sent again
    /// from the start. Returns whether anything was buffered.
    pub fn discard_file(
        &mut self,
        filename: &str,
    ) -> bool {
        self.buffers.remove(filename).is_some()
    }

    /// Looks up a materialized parameter by name.
    pub fn get_parameter(
        &self,
        name: &str,
    ) -> Result<&C::DeviceArray, ParameterError> {
        self.parameter_store()?.get(name)
    }

    pub fn parameter_store(
        &self
    ) -> Result<&ParameterStore<C::DeviceArray>, ParameterError> {
        match (&self.state, &self.store) {
            (LoadState::Materialized, Some(store)) => Ok(store),
            (LoadState::Failed, _) => Err(ParameterError::LoadingFailed),
            _ => Err(ParameterError::NotReady),
        }
    }

    /// Replaces the tensor stored for `name`, e.g. after an optimizer step,
    /// and returns the previous tensor.
    pub fn replace_parameter(
        &mut self,
        name: &str,
        tensor: C::DeviceArray,
    ) -> Result<C::DeviceArray, ParameterError> {
        match (&self.state, &mut self.store) {
            (LoadState::Materialized, Some(store)) => store.replace(name, tensor),
            (LoadState::Failed, _) => Err(ParameterError::LoadingFailed),
            _ => Err(ParameterError::NotReady),
        }
    }

    pub fn into_parameter_store(
        self
    ) -> Result<ParameterStore<C::DeviceArray>, ParameterError> {
        match (self.state, self.store) {
            (LoadState::Materialized, Some(store)) => Ok(store),
            (LoadState::Failed, _) => Err(ParameterError::LoadingFailed),
            _ => Err(ParameterError::NotReady),
        }
    }

    /// Runs a training step over `inputs` and every parameter in declared
    /// order, and collects the per-parameter gradients.
    pub fn compute_gradients<S: TrainStep<C::DeviceArray>>(
        &self,
        step: &S,
        inputs: &[&C::DeviceArray],
    ) -> Result<GradientResult<C::DeviceArray>, ParameterError> {
        let store = self.parameter_store()?;
        let parameters: Vec<&C::DeviceArray> = store.tensors().iter().collect();
        let output = step.call(inputs, &parameters);
        Ok(GradientResult::from_step_output(
            output,
            store.names(),
            inputs.len(),
        ))
    }

    fn ensure_loading(&self) -> Result<(), ParameterError> {
        match self.state {
            LoadState::Loading {
                ..
            } => Ok(()),
            LoadState::AllShardsIngested | LoadState::Materialized => {
                Err(ParameterError::AlreadyMaterialized)
            },
            LoadState::Failed => Err(ParameterError::LoadingFailed),
        }
    }

    fn open_buffer(
        &self,
        filename: &str,
    ) -> Result<ShardBuffer, ParameterError> {
        let group = resolve_shard(&self.metadata, filename)?;
        if self.completed_shards.contains(&group.index) {
            return Err(ParameterError::DuplicateCompletion {
                filename: filename.to_string(),
            });
        }
        Ok(ShardBuffer::new(filename, group.index, group.nbytes))
    }

    fn complete_shard(
        &mut self,
        filename: String,
        buffer: ShardBuffer,
    ) -> Result<Ingested, ParameterError> {
        let shard_index = buffer.shard_index();
        if self.completed_shards.contains(&shard_index) {
            return Err(ParameterError::DuplicateCompletion {
                filename,
            });
        }

        let tensors = self
            .parser
            .parse_shard(&self.context, &self.metadata, &filename, buffer.bytes())
            .inspect_err(|error| {
                warn!(file = %filename, %error, "abandoning shard file");
            })?;
        drop(buffer);

        let parameters = tensors.len();
        self.cache.extend(tensors);
        self.completed_shards.insert(shard_index);
        self.completed_files.insert(filename);

        let pending = self.pending_shards() - 1;
        info!(shard = shard_index, parameters, pending, "shard ingested");
        if pending > 0 {
            self.state = LoadState::Loading {
                pending,
            };
            return Ok(Ingested::ShardCompleted {
                shard_index,
                pending,
            });
        }

        self.state = LoadState::AllShardsIngested;
        self.materialize()?;
        Ok(Ingested::Materialized)
    }

    fn materialize(&mut self) -> Result<(), ParameterError> {
        debug_assert_eq!(
            self.cache.len(),
            self.metadata.descriptors().count(),
            "cache must hold every described parameter"
        );
        self.buffers.clear();

        match materialize(&self.parameter_order, &mut self.cache) {
            Ok(store) => {
                info!(
                    parameters = store.len(),
                    "parameter store materialized"
                );
                self.store = Some(store);
                self.state = LoadState::Materialized;
                Ok(())
            },
            Err(materialize_error) => {
                error!(error = %materialize_error, "parameter materialization failed");
                self.cache.clear();
                self.state = LoadState::Failed;
                Err(materialize_error)
            },
        }
    }
}
