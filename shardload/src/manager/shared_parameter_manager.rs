use std::{
    collections::HashMap,
    sync::{
        Condvar, Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use tracing::{debug, error, info, warn};

use super::{Ingested, LoadState, read_metadata};
use crate::{
    DeviceContext,
    parameters::{
        MetadataSource, NamedTensorCache, ParameterError, ParameterStore,
        ShardBuffer, ShardMetadata, ShardParser, materialize, resolve_shard,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    Open,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Materialized,
    Failed,
}

/// Parameter loading session fed by several producers at once.
///
/// Each producer claims a shard file through [`Self::shard_writer`] and
/// streams it into its own [`ShardWriter`]. The producer whose shard brings
/// the pending count to zero materializes the store; readers block on
/// [`Self::wait`] until that happened.
pub struct SharedParameterManager<C: DeviceContext> {
    context: C,
    metadata: ShardMetadata,
    parameter_order: Box<[String]>,
    claims: Mutex<HashMap<usize, Claim>>,
    cache: Mutex<NamedTensorCache<C::DeviceArray>>,
    pending: AtomicUsize,
    store: OnceLock<ParameterStore<C::DeviceArray>>,
    outcome: Mutex<Option<Outcome>>,
    finished: Condvar,
}

impl<C: DeviceContext> SharedParameterManager<C> {
    pub fn new(
        context: C,
        source: &impl MetadataSource,
    ) -> Result<Self, ParameterError> {
        let (metadata, parameter_order) = read_metadata(source)?;
        let total_shards = metadata.total_shard_count();
        info!(
            shards = total_shards,
            parameters = parameter_order.len(),
            "shared parameter manager created"
        );
        Ok(Self {
            context,
            metadata,
            parameter_order,
            claims: Mutex::new(HashMap::new()),
            cache: Mutex::new(NamedTensorCache::new()),
            pending: AtomicUsize::new(total_shards),
            store: OnceLock::new(),
            outcome: Mutex::new(None),
            finished: Condvar::new(),
        })
    }

    pub fn metadata(&self) -> &ShardMetadata {
        &self.metadata
    }

    pub fn declared_parameter_order(&self) -> &[String] {
        &self.parameter_order
    }

    pub fn pending_shards(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LoadState {
        match *self.outcome.lock().unwrap() {
            Some(Outcome::Materialized) => LoadState::Materialized,
            Some(Outcome::Failed) => LoadState::Failed,
            None => match self.pending_shards() {
                0 => LoadState::AllShardsIngested,
                pending => LoadState::Loading {
                    pending,
                },
            },
        }
    }

    /// Claims the shard that `filename` refers to for one producer.
    pub fn shard_writer(
        &self,
        filename: &str,
    ) -> Result<ShardWriter<'_, C>, ParameterError> {
        self.ensure_loading()?;
        let group = resolve_shard(&self.metadata, filename)?;

        let mut claims = self.claims.lock().unwrap();
        match claims.get(&group.index) {
            Some(Claim::Open) => {
                return Err(ParameterError::ShardInProgress {
                    filename: filename.to_string(),
                });
            },
            Some(Claim::Completed) => {
                return Err(ParameterError::DuplicateCompletion {
                    filename: filename.to_string(),
                });
            },
            None => {
                claims.insert(group.index, Claim::Open);
            },
        }
        drop(claims);

        debug!(file = filename, shard = group.index, "shard claimed");
        Ok(ShardWriter {
            manager: self,
            buffer: ShardBuffer::new(filename, group.index, group.nbytes),
            parser: ShardParser::new(),
            completed: false,
        })
    }

    /// Looks up a parameter without blocking.
    pub fn get_parameter(
        &self,
        name: &str,
    ) -> Result<&C::DeviceArray, ParameterError> {
        self.parameter_store()?.get(name)
    }

    pub fn parameter_store(
        &self
    ) -> Result<&ParameterStore<C::DeviceArray>, ParameterError> {
        if let Some(store) = self.store.get() {
            return Ok(store);
        }
        match *self.outcome.lock().unwrap() {
            Some(Outcome::Failed) => Err(ParameterError::LoadingFailed),
            _ => Err(ParameterError::NotReady),
        }
    }

    /// Blocks until the session either materialized or failed.
    pub fn wait(
        &self
    ) -> Result<&ParameterStore<C::DeviceArray>, ParameterError> {
        let mut outcome = self.outcome.lock().unwrap();
        while outcome.is_none() {
            outcome = self.finished.wait(outcome).unwrap();
        }
        drop(outcome);
        self.parameter_store()
    }

    pub fn into_parameter_store(
        self
    ) -> Result<ParameterStore<C::DeviceArray>, ParameterError> {
        let outcome = *self.outcome.lock().unwrap();
        match (outcome, self.store.into_inner()) {
            (Some(Outcome::Materialized), Some(store)) => Ok(store),
            (Some(Outcome::Failed), _) => Err(ParameterError::LoadingFailed),
            _ => Err(ParameterError::NotReady),
        }
    }

    fn ensure_loading(&self) -> Result<(), ParameterError> {
        match *self.outcome.lock().unwrap() {
            Some(Outcome::Materialized) => {
                Err(ParameterError::AlreadyMaterialized)
            },
            Some(Outcome::Failed) => Err(ParameterError::LoadingFailed),
            None if self.pending_shards() == 0 => {
                Err(ParameterError::AlreadyMaterialized)
            },
            None => Ok(()),
        }
    }

    fn release_claim(
        &self,
        shard_index: usize,
    ) {
        let mut claims = self.claims.lock().unwrap();
        if claims.get(&shard_index) == Some(&Claim::Open) {
            claims.remove(&shard_index);
        }
    }

    fn complete(
        &self,
        shard_index: usize,
        tensors: Vec<(String, C::DeviceArray)>,
    ) -> Result<Ingested, ParameterError> {
        let parameters = tensors.len();
        self.cache.lock().unwrap().extend(tensors);
        self.claims
            .lock()
            .unwrap()
            .insert(shard_index, Claim::Completed);

        let pending = self.pending.fetch_sub(1, Ordering::AcqRel) - 1;
        info!(shard = shard_index, parameters, pending, "shard ingested");
        if pending > 0 {
            return Ok(Ingested::ShardCompleted {
                shard_index,
                pending,
            });
        }

        self.materialize()?;
        Ok(Ingested::Materialized)
    }

    fn materialize(&self) -> Result<(), ParameterError> {
        let mut cache = self.cache.lock().unwrap();
        let result = materialize(&self.parameter_order, &mut cache);
        let outcome = match &result {
            Ok(_) => Outcome::Materialized,
            Err(materialize_error) => {
                error!(error = %materialize_error, "parameter materialization failed");
                cache.clear();
                Outcome::Failed
            },
        };
        drop(cache);

        let result = result.map(|store| {
            info!(parameters = store.len(), "parameter store materialized");
            if self.store.set(store).is_err() {
                unreachable!("parameter store published twice");
            }
        });

        *self.outcome.lock().unwrap() = Some(outcome);
        self.finished.notify_all();
        result
    }
}

/// Exclusive writer for one claimed shard file.
///
/// Dropping a writer that was not finished successfully releases the claim,
/// so the file can be sent again from the start.
pub struct ShardWriter<'manager, C: DeviceContext> {
    manager: &'manager SharedParameterManager<C>,
    buffer: ShardBuffer,
    parser: ShardParser,
    completed: bool,
}

impl<C: DeviceContext> ShardWriter<'_, C> {
    pub fn filename(&self) -> &str {
        self.buffer.filename()
    }

    pub fn shard_index(&self) -> usize {
        self.buffer.shard_index()
    }

    pub fn received(&self) -> usize {
        self.buffer.len()
    }

    pub fn append(
        &mut self,
        chunk: &[u8],
    ) {
        self.buffer.append(chunk);
    }

    /// Parses the received bytes and hands the tensors to the manager.
    pub fn finish(mut self) -> Result<Ingested, ParameterError> {
        let manager = self.manager;
        let tensors = self
            .parser
            .parse_shard(
                &manager.context,
                &manager.metadata,
                self.buffer.filename(),
                self.buffer.bytes(),
            )
            .inspect_err(|error| {
                warn!(
                    file = self.buffer.filename(),
                    %error,
                    "abandoning shard file"
                );
            })?;
        self.completed = true;
        self.buffer.release();
        manager.complete(self.buffer.shard_index(), tensors)
    }
}

impl<C: DeviceContext> Drop for ShardWriter<'_, C> {
    fn drop(&mut self) {
        if !self.completed {
            debug!(file = self.buffer.filename(), "shard claim released");
            self.manager.release_claim(self.buffer.shard_index());
        }
    }
}
