use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use naview_core::{Layout, Naview, NaviewConfig, Point, PseudoknotPolicy, Radloop};

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Json,
    Tsv,
}

/// NAView layout of RNA secondary structures
#[derive(Parser)]
#[command(name = "naview", version)]
struct Cli {
    /// Dot-bracket structure notation; ([{< brackets may cross
    #[arg(short, long)]
    structure: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Minimum spacing, in backbone units, before a loop segment is extruded
    #[arg(long)]
    lencut: Option<f64>,

    /// Distance between consecutive base pairs in a helix, in backbone units
    #[arg(long)]
    helix_factor: Option<f64>,

    /// Output length of one backbone unit
    #[arg(long)]
    backbone_distance: Option<f64>,

    /// Divisor applied to every fitted loop radius (below sqrt 2)
    #[arg(long)]
    radius_reduction: Option<f64>,

    /// Pin a loop radius, e.g. --radloop 3=2.5 (repeatable)
    #[arg(long, value_parser = parse_radloop)]
    radloop: Vec<Radloop>,

    /// Drop crossing pairs instead of rejecting the structure
    #[arg(long)]
    strip_pseudoknots: bool,

    /// Fail when loop segments still cross after extrusion
    #[arg(long)]
    strict_crossings: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_radloop(s: &str) -> Result<Radloop, String> {
    let (number, radius) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LOOP=RADIUS, got '{s}'"))?;
    let loop_number = number
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad loop number '{number}': {e}"))?;
    let radius = radius
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad radius '{radius}': {e}"))?;
    Ok(Radloop {
        loop_number,
        radius,
    })
}

impl Cli {
    fn config(&self) -> NaviewConfig {
        let mut config = NaviewConfig::default();
        if let Some(v) = self.lencut {
            config.lencut = v;
        }
        if let Some(v) = self.helix_factor {
            config.helix_factor = v;
        }
        if let Some(v) = self.backbone_distance {
            config.backbone_distance = v;
        }
        if let Some(v) = self.radius_reduction {
            config.radius_reduction_factor = v;
        }
        config.radloops = self.radloop.clone();
        if self.strip_pseudoknots {
            config.pseudoknots = PseudoknotPolicy::Strip;
        }
        config.strict_crossings = self.strict_crossings;
        config
    }
}

fn to_tsv(coordinates: &[Point]) -> String {
    let mut out = String::from("index\tx\ty\n");
    for (i, p) in coordinates.iter().enumerate() {
        out.push_str(&format!("{i}\t{:.4}\t{:.4}\n", p.x, p.y));
    }
    out
}

fn render(layout: &Layout, format: Format) -> Result<String, serde_json::Error> {
    match format {
        Format::Json => serde_json::to_string_pretty(layout).map(|mut s| {
            s.push('\n');
            s
        }),
        Format::Tsv => Ok(to_tsv(&layout.coordinates)),
    }
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let pt = naview_core::parse(&cli.structure)?;
    let engine = Naview::new(cli.config())?;
    log::debug!("config: {:?}", engine.config());
    let layout = engine.layout(&pt)?;
    log::info!(
        "laid out {} bases in {} loops",
        layout.coordinates.len(),
        layout.loops.len()
    );
    if !layout.crossed_loops.is_empty() {
        log::warn!("loops with crossing segments: {:?}", layout.crossed_loops);
    }
    Ok(render(&layout, cli.format)?)
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let output = match run(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if let Some(path) = cli.output {
        if let Err(e) = std::fs::write(&path, &output) {
            eprintln!("error: failed to write {}: {e}", path.display());
            process::exit(1);
        }
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = handle.write_all(output.as_bytes()) {
            eprintln!("error: write failed: {e}");
            process::exit(1);
        }
    }
}
