//! glv command line.
//!
//! Parses protocol files and/or stdin into a scene tree and reports on it,
//! and exposes the stream filters as subcommands.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use glv_filters::{ColorMap, GrepOptions, ScalarOptions};
use glv_parser::{LineReader, ParseOutcome, StreamParser, ViewerEvent, ViewerSettings};
use glv_scene::{RenderMode, SceneNode};

mod stats;

use stats::CountingRenderer;

#[derive(Parser)]
#[command(name = "glv")]
#[command(about = "Streaming 3D scene description parser and filters", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args)]
struct ViewArgs {
    /// Files to read, in order (.gz and .bz2 are decompressed)
    files: Vec<PathBuf>,

    /// Read stdin after the files, logging errors instead of stopping
    #[arg(short, long)]
    interactive: bool,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum primitives per renderer batch (at least 2)
    #[arg(long)]
    optim: Option<usize>,

    /// Smooth per-vertex normals for indexed meshes
    #[arg(long)]
    smooth: bool,

    /// Render mode used for the draw statistics
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Print the scene tree
    #[arg(long)]
    dump: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace volume cells by their boundary facets
    Skin {
        /// Input stream (default: stdin)
        input: Option<PathBuf>,
    },
    /// Keep lines and raw sections matching a pattern
    Grep {
        /// Substring to match
        pattern: String,
        /// Input stream (default: stdin)
        input: Option<PathBuf>,
        /// Keep non-matching lines instead
        #[arg(short = 'x', long)]
        invert: bool,
    },
    /// Turn scalar values into vertex colors
    #[command(name = "scalar2color")]
    ScalarToColor {
        /// Input stream (default: stdin)
        input: Option<PathBuf>,
        /// Value mapped to the first color
        #[arg(long, default_value_t = 0.0)]
        min: f64,
        /// Value mapped to the last color
        #[arg(long, default_value_t = 1.0)]
        max: f64,
        /// Use each raw section's own range
        #[arg(long)]
        auto: bool,
        /// Interpolate from this color (name or r,g,b) instead of the hue ramp
        #[arg(long, requires = "color_max")]
        color_min: Option<String>,
        /// Interpolate to this color (name or r,g,b)
        #[arg(long, requires = "color_min")]
        color_max: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Full,
    Bbox,
    Simplified,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => RenderMode::Full,
            ModeArg::Bbox => RenderMode::BoundingBox,
            ModeArg::Simplified => RenderMode::Simplified,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match cli.command {
        Some(Commands::Skin { input }) => {
            let stats = glv_filters::skin(open_input(input.as_deref())?, stdout())?;
            log::info!("{} cells, {} boundary facets", stats.cells, stats.facets);
        }
        Some(Commands::Grep {
            pattern,
            input,
            invert,
        }) => {
            let mut options = GrepOptions::new(pattern);
            options.invert = invert;
            glv_filters::grep(open_input(input.as_deref())?, stdout(), &options)?;
        }
        Some(Commands::ScalarToColor {
            input,
            min,
            max,
            auto,
            color_min,
            color_max,
        }) => {
            let map = match (color_min, color_max) {
                (Some(low), Some(high)) => ColorMap::Linear {
                    low: glv_filters::parse_color(&low)?,
                    high: glv_filters::parse_color(&high)?,
                },
                _ => ColorMap::Hue,
            };
            let options = ScalarOptions {
                map,
                min,
                max,
                auto_range: auto,
            };
            glv_filters::scalar_to_color(open_input(input.as_deref())?, stdout(), &options)?;
        }
        None => view(cli.view)?,
    }

    Ok(())
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Can't open file : {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    })
}

fn stdout() -> BufWriter<io::StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}

fn settings_for(args: &ViewArgs) -> Result<ViewerSettings> {
    let mut settings = match &args.config {
        Some(path) => ViewerSettings::load(path)?,
        None => ViewerSettings::default(),
    };
    if let Some(optim) = args.optim {
        settings.optimizer_threshold = optim;
        settings.clamp_optimizer_threshold();
    }
    if args.smooth {
        settings.smooth_normals = true;
    }
    if let Some(mode) = args.mode {
        settings.render_mode = mode.into();
    }
    settings.validate()?;
    Ok(settings)
}

fn view(args: ViewArgs) -> Result<()> {
    let settings = settings_for(&args)?;
    let mut parser = StreamParser::new(settings);

    let mut outcome = ParseOutcome::Finished;
    for file in &args.files {
        outcome = parser.parse_file(file)?;
        report_events(&mut parser);
        if outcome == ParseOutcome::Exit {
            break;
        }
    }

    if outcome != ParseOutcome::Exit && (args.files.is_empty() || args.interactive) {
        parser.set_ignore_errors(args.interactive || parser.settings().ignore_errors);
        let mut lines =
            LineReader::new(io::stdin().lock()).with_poll_interval(parser.settings().poll_interval());
        outcome = parser.read_stream(&mut lines)?;
        report_events(&mut parser);
    }
    if outcome == ParseOutcome::Exit {
        log::info!("exit requested");
    }

    let params = parser.settings().render_params();
    let mut root = parser.into_root();

    let mut out = stdout();
    if args.dump {
        root.dump(&mut out)?;
    }
    summarize(&mut root, &params, &mut out)?;
    out.flush()?;
    Ok(())
}

fn report_events(parser: &mut StreamParser) {
    for event in parser.take_events() {
        match event {
            ViewerEvent::Title(title) => log::info!("title: {title}"),
            ViewerEvent::Snapshot {
                width,
                height,
                path,
            } => log::info!("snapshot {width}x{height} requested: {}", path.display()),
            ViewerEvent::View(view) => log::info!("view centered on {}", view.center),
        }
    }
}

fn summarize(
    root: &mut SceneNode,
    params: &glv_scene::RenderParams,
    out: &mut impl Write,
) -> Result<()> {
    let stats = root.stats();
    writeln!(out, "Nodes              : {}", stats.nodes)?;
    writeln!(out, "Primitives         : {}", stats.primitives)?;
    writeln!(out, "Indexed primitives : {}", stats.indexed_primitives)?;
    writeln!(out, "Shared vertices    : {}", stats.vertices)?;

    let bbox = root.bounding_box();
    match (bbox.min(), bbox.max()) {
        (Some(min), Some(max)) => {
            writeln!(
                out,
                "Bounding box       : [{}, {}, {}] - [{}, {}, {}]",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }
        _ => writeln!(out, "Bounding box       : Empty")?,
    }

    let mut renderer = CountingRenderer::default();
    root.render(&mut renderer, params);
    writeln!(
        out,
        "Draw calls ({:?}) : {} batches of {}, {} indexed batches of {}, {} boxes, {} directives, depth {}",
        params.mode,
        renderer.batches,
        renderer.primitives,
        renderer.indexed_batches,
        renderer.indexed_primitives,
        renderer.boxes,
        renderer.directives,
        renderer.max_depth
    )?;
    Ok(())
}
