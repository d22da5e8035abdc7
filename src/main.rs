use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thumbsmith::naming::{self, ThumbnailName};
use thumbsmith::transform::{TransformDescriptor, TransformMethod};
use thumbsmith::{config, output, process};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that process images.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the thumbnail cache and re-encode every preset
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "thumbsmith")]
#[command(about = "Thumbnail generator driven by compact transformation tokens")]
#[command(long_about = "\
Thumbnail generator driven by compact transformation tokens

Every thumbnail is described by a method (resize or crop) and, for crops, a
horizontal and vertical anchor. The non-default parts are encoded as a short
token that becomes part of the thumbnail's file name:

  token         method   horizontal  vertical
  (empty)       resize   center      middle
  -crop         crop     center      middle
  -crop-top     crop     center      top
  -crop-left-bottom
                crop     left        bottom

  dawn.jpg  →  dawn-400x500-crop.webp
               dawn-200x200-crop-top.webp
               dawn-1200x1200.webp

Presets live in thumbsmith.toml inside the source directory.
Run 'thumbsmith gen-config' to generate a documented config file.
Set RUST_LOG (or pass -v) for diagnostic logging on stderr.")]
#[command(version)]
struct Cli {
    /// Directory containing source images and thumbsmith.toml
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory for thumbnails, cache and manifest
    #[arg(long, default_value = "thumbnails", global = true)]
    output: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a transformation token and show its fields
    Inspect {
        /// Token such as "-crop-left-top" (may be empty)
        #[arg(allow_hyphen_values = true, default_value = "")]
        token: String,
    },
    /// Build a transformation and print its token
    Encode {
        #[arg(long, default_value_t = thumbsmith::transform::DEFAULT_METHOD)]
        method: TransformMethod,
        /// Horizontal anchor (left, center, right); crop only
        #[arg(long)]
        horizontal: Option<String>,
        /// Vertical anchor (top, middle, bottom); crop only
        #[arg(long)]
        vertical: Option<String>,
    },
    /// Print a thumbnail file name, or decode one with --parse
    Name {
        /// Source file stem
        #[arg(required_unless_present = "parse")]
        stem: Option<String>,
        #[arg(long, default_value_t = 400)]
        width: u32,
        #[arg(long, default_value_t = 500)]
        height: u32,
        /// Transformation token
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        transform: String,
        /// Output extension
        #[arg(long, default_value = "webp")]
        ext: String,
        /// Decode an existing thumbnail file name instead
        #[arg(long, conflicts_with = "stem")]
        parse: Option<String>,
    },
    /// Generate thumbnails for every preset of every source image
    Process(CacheArgs),
    /// Validate thumbsmith.toml and list the resolved presets
    Check,
    /// Print a stock thumbsmith.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Inspect { token } => {
            output::print_descriptor(&TransformDescriptor::parse(&token));
        }
        Command::Encode {
            method,
            horizontal,
            vertical,
        } => {
            let mut transform = match method {
                TransformMethod::Crop => TransformDescriptor::crop(),
                TransformMethod::Resize => TransformDescriptor::resize(),
            };
            if let Some(word) = &horizontal {
                transform = transform.with_horizontal_anchor_named(word)?;
            }
            if let Some(word) = &vertical {
                transform = transform.with_vertical_anchor_named(word)?;
            }
            println!("{}", transform.encode());
        }
        Command::Name {
            stem,
            width,
            height,
            transform,
            ext,
            parse,
        } => match (parse, stem) {
            (Some(file_name), _) => {
                let name = naming::parse_thumbnail_name(&file_name)
                    .ok_or_else(|| format!("not a thumbnail file name: {file_name}"))?;
                output::print_thumbnail_name(&name);
            }
            (None, Some(stem)) => {
                let name = ThumbnailName::new(
                    stem,
                    (width, height),
                    TransformDescriptor::parse(&transform),
                    ext,
                );
                println!("{}", name.file_name());
            }
            (None, None) => return Err("a stem or --parse is required".into()),
        },
        Command::Process(cache_args) => {
            let config = config::load_config(&cli.source)?;
            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(
                &cli.source,
                &cli.output,
                &config,
                !cache_args.no_cache,
                Some(tx),
            )?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let manifest_path = cli.output.join("manifest.json");
            let json = serde_json::to_string_pretty(&result.manifest)?;
            std::fs::write(&manifest_path, json)?;
            output::print_process_summary(&result.manifest, &result.cache_stats);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let config = config::load_config(&cli.source)?;
            output::print_presets(&config.thumbnail_configs()?);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; stdout carries command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
