use console::Style;
use shardload::{
    LoaderConfig,
    parameters::{MetadataSource, ShardMetadata},
};

fn print_shards(metadata: &ShardMetadata) {
    let style_shard = Style::new().bold();
    for group in metadata.groups() {
        println!(
            "{}",
            style_shard.apply_to(format!(
                "shard {} {} ({} bytes)",
                group.index,
                group.data_path.as_deref().unwrap_or("-"),
                group
                    .nbytes
                    .map_or_else(|| String::from("?"), |nbytes| nbytes.to_string()),
            ))
        );
        for descriptor in &group.parameters {
            println!(
                "  {:<40} {:<16} {:<10} {:<12} [{}..{})",
                descriptor.name,
                format!("{:?}", descriptor.shape),
                descriptor.data_type.manifest_name(),
                descriptor.encoding.to_string(),
                descriptor.byte_offset,
                descriptor.byte_offset + descriptor.byte_length,
            );
        }
    }
}

pub fn handle_inspect(model_path: String) -> anyhow::Result<()> {
    let config = LoaderConfig::new(model_path);
    let source = config.metadata_source()?;
    let metadata = source.shard_metadata()?;
    print_shards(&metadata);

    let declared = source.declared_parameter_order()?;
    let style_dim = Style::new().dim();
    let model_type = source
        .model()
        .and_then(|model| model.model_type.as_deref())
        .unwrap_or("unknown");
    println!(
        "\n{}",
        style_dim.apply_to(format!(
            "{} shards, {} declared parameters, model type {}",
            metadata.total_shard_count(),
            declared.len(),
            model_type,
        ))
    );

    Ok(())
}
