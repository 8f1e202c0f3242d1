use clap::{CommandFactory, Parser, Subcommand};
use cli::{
    handlers::{handle_inspect, handle_load},
    logging::init_logging,
};

#[derive(Parser)]
#[command(version = shardload::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream every shard of a model into a parameter manager
    Load {
        /// Folder with the model's shard manifest and shard files
        model_path: String,
        /// Bytes sent per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Send the shard files in a random order
        #[arg(long)]
        shuffle: bool,
        /// Seed for --shuffle
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the shard layout of a model
    Inspect {
        /// Folder with the model's shard manifest
        model_path: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging("info")?;

    match cli.command {
        Some(Commands::Load {
            model_path,
            chunk_size,
            shuffle,
            seed,
        }) => {
            let seed = shuffle.then_some(seed);
            handle_load(model_path, chunk_size, seed)?;
        },
        Some(Commands::Inspect {
            model_path,
        }) => {
            handle_inspect(model_path)?;
        },
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
        },
    }

    Ok(())
}
