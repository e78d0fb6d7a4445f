use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use dressing_room::PosterSink as _;

#[derive(Parser, Debug)]
#[command(name = "dressing-room", version)]
struct Cli {
    /// Room configuration JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dress the model and write a poster PNG.
    Poster(PosterArgs),
    /// Write one viewport frame as a PNG.
    Capture(CaptureArgs),
}

#[derive(Parser, Debug)]
struct PosterArgs {
    /// Style key, e.g. `晚宴`.
    #[arg(long)]
    style: String,

    /// Outfit key, e.g. `D`.
    #[arg(long)]
    outfit: String,

    /// Frames to advance before capturing.
    #[arg(long, default_value_t = 30)]
    frames: u32,

    /// Outfit descriptions JSON (`{ style: { outfit: text } }`).
    #[arg(long)]
    descriptions: Option<PathBuf>,

    /// Footer date label.
    #[arg(long)]
    date: Option<String>,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Which viewport to capture.
    #[arg(long, value_enum, default_value_t = ViewChoice::Model)]
    view: ViewChoice,

    /// Style key (model view only).
    #[arg(long)]
    style: Option<String>,

    /// Outfit key (model view only).
    #[arg(long)]
    outfit: Option<String>,

    /// Frames to advance before capturing.
    #[arg(long, default_value_t = 0)]
    frames: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewChoice {
    Host,
    Model,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = read_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Poster(args) => cmd_poster(cfg, args),
        Command::Capture(args) => cmd_capture(cfg, args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<dressing_room::RoomConfig> {
    let cfg = match path {
        Some(p) => dressing_room::RoomConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => dressing_room::RoomConfig::default(),
    };
    Ok(cfg)
}

fn warm_up(room: &mut dressing_room::DressingRoom, frames: u32) {
    for _ in 0..frames {
        room.tick();
    }
}

fn cmd_poster(cfg: dressing_room::RoomConfig, args: PosterArgs) -> anyhow::Result<()> {
    let mut room = dressing_room::DressingRoom::new(cfg)?;
    if let Some(path) = &args.descriptions {
        let table = dressing_room::MapDescriptions::from_path(path)
            .with_context(|| format!("load descriptions '{}'", path.display()))?;
        room.set_descriptions(Box::new(table));
    }

    if let Err(e) = room.show_host() {
        eprintln!("host unavailable: {e}");
    }
    if let Err(e) = room.dress(&args.style, &args.outfit) {
        eprintln!("dressing failed: {e}");
    }
    warm_up(&mut room, args.frames);

    let mut req = room.poster_request(&args.style, &args.outfit);
    if let Some(date) = args.date {
        req = req.with_date_label(date);
    }
    let poster = room.generate_poster_with(&req)?;

    let mut sink = dressing_room::DirPosterSink::new(&args.out_dir);
    sink.deliver(&poster)?;
    for path in sink.written() {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_capture(cfg: dressing_room::RoomConfig, args: CaptureArgs) -> anyhow::Result<()> {
    let mut room = dressing_room::DressingRoom::new(cfg)?;
    let view = match args.view {
        ViewChoice::Host => {
            room.show_host()?;
            dressing_room::RoomView::Host
        }
        ViewChoice::Model => {
            let (Some(style), Some(outfit)) = (&args.style, &args.outfit) else {
                anyhow::bail!("--style and --outfit are required for the model view");
            };
            room.dress(style, outfit)?;
            dressing_room::RoomView::Model
        }
    };
    warm_up(&mut room, args.frames);

    let capture = room
        .capture(view)
        .context("viewport has nothing to capture")?;
    let png = capture.raster.encode_png()?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
