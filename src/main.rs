use clap::{Args, Parser, Subcommand};
use respimg::config::{self, ResponsiveConfig};
use respimg::facade::Responsive;
use respimg::imaging::{
    OriginalImage, ResampleTarget, ResizeMethod, RustBackend, SourceImage, ZeroDimensionPolicy,
    compute_dimensions, compute_from_minimum, pregenerate_variants,
};
use respimg::{output, render};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "respimg")]
#[command(about = "Responsive image tiers, blurred placeholders and markup")]
#[command(long_about = "\
Responsive image tiers, blurred placeholders and markup

Every placement of an image gets four tiers derived from a target size:

  tiny     blurred placeholder, inlined as a data URI (driving axis <= 64px)
  small    target * 0.25
  medium   target * 0.5
  large    the target size itself

Derived files are written next to the original:

  photos/
  ├── lenna.jpg
  └── _resampled/
      ├── Blur8-SetWidth60x41-lenna.jpg
      ├── SetWidth60x41-lenna.jpg
      ├── SetWidth121x82-lenna.jpg
      └── SetWidth243x164-lenna.jpg

A large tier at the original's own size is served by the original itself.

Set RUST_LOG=debug to see variant generation.

Run 'respimg gen-config' to generate a documented respimg.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing respimg.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that resample an image.
#[derive(Args, Clone)]
struct ImageArgs {
    /// Original image file
    image: PathBuf,

    /// Where derived files go [default: <image dir>/<images.resampled_dir>]
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// URL prefix of derived files [default: <images.resampled_dir>]
    #[arg(long)]
    base_url: Option<String>,

    /// URL of the original image [default: its file name]
    #[arg(long)]
    image_url: Option<String>,

    /// Resize method [default: method.default_method]
    #[arg(long)]
    method: Option<ResizeMethod>,

    /// Target width (height methods read a lone width as the height)
    #[arg(long)]
    width: Option<u32>,

    /// Target height
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tier dimensions for a target size
    Dims {
        #[arg(long, allow_negative_numbers = true)]
        width: f64,
        #[arg(long, allow_negative_numbers = true)]
        height: f64,
        /// Resize method [default: method.default_method]
        #[arg(long)]
        method: Option<ResizeMethod>,
        /// Reject zero or negative sizes instead of computing degenerate tiers
        #[arg(long)]
        strict: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print small/medium/large sizes grown from a minimum size
    MinSizes {
        /// Original width
        #[arg(long)]
        original_width: u32,
        /// Original height
        #[arg(long)]
        original_height: u32,
        /// Minimum width (0 = derive from the height)
        #[arg(long, default_value_t = 0.0)]
        min_width: f64,
        /// Minimum height (0 = derive from the width)
        #[arg(long, default_value_t = 0.0)]
        min_height: f64,
        /// Resize method [default: method.default_method]
        #[arg(long)]
        method: Option<ResizeMethod>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Resample an image and print its responsive markup
    Tag {
        #[command(flatten)]
        image: ImageArgs,
        /// Media query for the sizes attribute
        #[arg(long)]
        media_query: Option<String>,
        /// Extra classes for the tag
        #[arg(long)]
        classes: Option<String>,
        /// Alt text
        #[arg(long)]
        title: Option<String>,
        /// Print an opening container tag instead of an <img>
        #[arg(long, conflicts_with = "background")]
        open: bool,
        /// Print background attributes instead of an <img>
        #[arg(long)]
        background: bool,
    },
    /// Pre-generate every tier of an image in parallel
    Generate(ImageArgs),
    /// Print a stock respimg.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Dims {
            width,
            height,
            method,
            strict,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            let settings = config.settings();
            let method = method.unwrap_or(settings.default_method);
            let policy = if strict {
                ZeroDimensionPolicy::Strict
            } else {
                settings.zero_policy
            };
            let dims = compute_dimensions(width, height, method, &settings.factors, policy)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dims)?);
            } else {
                output::print_dims_output(method, width, height, &dims);
            }
        }
        Command::MinSizes {
            original_width,
            original_height,
            min_width,
            min_height,
            method,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            let method = method.unwrap_or(config.method.default_method);
            let sizes = compute_from_minimum(
                (original_width, original_height),
                (min_width, min_height),
                method,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sizes)?);
            } else {
                output::print_min_sizes_output(method, (original_width, original_height), &sizes);
            }
        }
        Command::Tag {
            image,
            media_query,
            classes,
            title,
            open,
            background,
        } => {
            let config = config::load_config(&cli.config)?;
            render::set_source_file_comments(config.render.source_file_comments);
            let backend = RustBackend::new();
            let mut source = open_source(&backend, &image, &config)?;
            if let Some(title) = title {
                source = source.with_title(title);
            }

            let mut responsive = Responsive::new(&backend, config.settings(), &source);
            apply_size(&mut responsive, &image, &config);
            if let Some(query) = media_query {
                responsive.media_query(query);
            }
            if let Some(classes) = classes {
                responsive.extra_classes(classes);
            }

            let html = if open {
                responsive.open_tag()
            } else if background {
                responsive.background_attr()
            } else {
                responsive.tag()
            };
            match html {
                Some(html) => println!("{}", html),
                None => {
                    // The cause was logged; surface it as the exit error.
                    responsive.image()?;
                    return Err("nothing rendered".into());
                }
            }
        }
        Command::Generate(image) => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let backend = RustBackend::new();
            let source = open_source(&backend, &image, &config)?;

            let mut responsive = Responsive::new(&backend, config.settings(), &source);
            apply_size(&mut responsive, &image, &config);
            let dims = responsive.dimensions()?;
            let method = responsive.method()?;

            let results = pregenerate_variants(&source, &dims, method);
            output::print_generate_output(
                &image.image,
                (source.width(), source.height()),
                method,
                &results,
            );
            if results.iter().any(|tv| tv.result.is_err()) {
                return Err("some tiers failed".into());
            }
        }
    }

    Ok(())
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn open_source<'b>(
    backend: &'b RustBackend,
    args: &ImageArgs,
    config: &ResponsiveConfig,
) -> Result<SourceImage<'b>, Box<dyn std::error::Error>> {
    let resampled = &config.images.resampled_dir;
    let dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| image_dir(&args.image).join(resampled));
    let base_url = args.base_url.clone().unwrap_or_else(|| resampled.clone());
    let target = ResampleTarget { dir, base_url };

    let mut source = SourceImage::open(
        backend,
        &args.image,
        target,
        config.settings().quality,
    )?;
    let image_url = match &args.image_url {
        Some(url) => url.clone(),
        None => source.filename().file_name().map_or_else(
            || args.image.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        ),
    };
    source = source.with_url(image_url);
    Ok(source)
}

fn image_dir(image: &Path) -> PathBuf {
    image
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn apply_size(responsive: &mut Responsive<'_>, args: &ImageArgs, config: &ResponsiveConfig) {
    if args.method.is_none() && args.width.is_none() && args.height.is_none() {
        return;
    }
    let method = args.method.unwrap_or(config.method.default_method);
    responsive.size(method, args.width, args.height);
}
