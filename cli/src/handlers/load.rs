use std::{fs::File, io::Read, path::Path, time::Instant};

use anyhow::Context;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use shardload::{
    Array, Ingested, LoaderConfig, ParameterManager,
    backends::cpu::CpuContext,
};
use tracing::info;

fn stream_file(
    manager: &mut ParameterManager<CpuContext>,
    path: &Path,
    filename: &str,
    chunk_size: usize,
    progress_bar: &ProgressBar,
) -> anyhow::Result<Ingested> {
    let mut file = File::open(path)
        .with_context(|| format!("Unable to open {}", path.display()))?;
    let size = file.metadata()?.len() as usize;
    let mut chunk = vec![0u8; chunk_size.min(size.max(1))];
    let mut sent = 0;
    loop {
        let length = chunk.len().min(size - sent);
        file.read_exact(&mut chunk[..length])
            .with_context(|| format!("Unable to read {}", path.display()))?;
        sent += length;
        progress_bar.inc(length as u64);
        let ingested =
            manager.ingest_chunk(filename, &chunk[..length], sent == size)?;
        if sent == size {
            return Ok(ingested);
        }
    }
}

pub fn handle_load(
    model_path: String,
    chunk_size: Option<usize>,
    shuffle_seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = LoaderConfig::new(model_path).with_env_overrides()?;
    if let Some(chunk_size) = chunk_size {
        config = config.chunk_size(chunk_size);
        config.validate()?;
    }

    let source = config.metadata_source().with_context(|| {
        format!("Unable to read {}", config.cache_metadata_path().display())
    })?;
    let mut manager = ParameterManager::new(CpuContext::new(), &source)?;

    let mut files: Vec<(&str, usize)> = source
        .manifest()
        .records
        .iter()
        .map(|record| (record.data_path.as_str(), record.nbytes))
        .collect();
    if let Some(seed) = shuffle_seed {
        files.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let total_bytes = files.iter().map(|(_, nbytes)| *nbytes as u64).sum();
    let progress_bar = ProgressBar::new(total_bytes);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.green} {bytes}/{total_bytes} {msg}")?,
    );

    let start = Instant::now();
    for (filename, _) in &files {
        progress_bar.set_message(filename.to_string());
        let ingested = stream_file(
            &mut manager,
            &config.shard_path(filename),
            filename,
            config.chunk_size,
            &progress_bar,
        )?;
        if let Ingested::ShardCompleted {
            pending,
            ..
        } = ingested
        {
            info!(file = filename, pending, "shard streamed");
        }
    }
    progress_bar.finish_and_clear();

    let store = manager.parameter_store()?;
    let style_header = Style::new().bold();
    let style_dim = Style::new().dim();
    println!(
        "{}",
        style_header.apply_to(format!(
            "{:<40} {:<16} {:<10} {:>12}",
            "Parameter", "Shape", "Type", "Bytes"
        ))
    );
    for (name, tensor) in store.iter() {
        println!(
            "{:<40} {:<16} {:<10} {:>12}",
            name,
            format!("{:?}", tensor.shape()),
            tensor.data_type().manifest_name(),
            tensor.size_in_bytes(),
        );
    }
    println!(
        "\n{}",
        style_dim.apply_to(format!(
            "{} parameters, {} bytes, {:.3}s",
            store.len(),
            store.total_size_in_bytes(),
            start.elapsed().as_secs_f64(),
        ))
    );

    Ok(())
}
