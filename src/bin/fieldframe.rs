use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "fieldframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the workplan as a numbered PNG frame sequence.
    Steps(StepsArgs),
    /// Export every realized field polygon as a JSON document.
    Json(JsonArgs),
}

#[derive(Parser, Debug)]
struct StepsArgs {
    /// Input plan bundle JSON (graph + workplan).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for step_NNN.png frames; created if absent.
    #[arg(long = "out-dir")]
    out_dir: PathBuf,

    /// Faction the plan is executed for.
    #[arg(long, value_enum)]
    faction: FactionChoice,

    /// Canvas resolution in dots per inch (the canvas is 11x8 inches).
    #[arg(long, default_value_t = 96)]
    dpi: u32,

    /// PNG-encode frames on the rayon pool after the sequence is frozen.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Parser, Debug)]
struct JsonArgs {
    /// Input plan bundle JSON (graph + workplan).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Faction the plan is executed for.
    #[arg(long, value_enum)]
    faction: FactionChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FactionChoice {
    Enl,
    Res,
}

impl From<FactionChoice> for fieldframe::Faction {
    fn from(choice: FactionChoice) -> Self {
        match choice {
            FactionChoice::Enl => fieldframe::Faction::Enl,
            FactionChoice::Res => fieldframe::Faction::Res,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Steps(args) => cmd_steps(args),
        Command::Json(args) => cmd_json(args),
    }
}

fn read_bundle(path: &Path) -> anyhow::Result<fieldframe::PlanBundle> {
    let f = File::open(path).with_context(|| format!("open bundle '{}'", path.display()))?;
    let r = BufReader::new(f);
    let bundle: fieldframe::PlanBundle =
        serde_json::from_reader(r).with_context(|| "parse bundle JSON")?;
    bundle.validate()?;
    Ok(bundle)
}

fn cmd_steps(args: StepsArgs) -> anyhow::Result<()> {
    let bundle = read_bundle(&args.in_path)?;
    let graph = bundle.graph();

    let opts = fieldframe::StepRenderOpts {
        dpi: args.dpi,
        parallel_encode: args.parallel,
    };
    let paths = fieldframe::render_workplan_steps(
        &graph,
        args.faction.into(),
        &bundle.steps,
        &args.out_dir,
        opts,
    )?;

    eprintln!("wrote {} frames into {}", paths.len(), args.out_dir.display());
    Ok(())
}

fn cmd_json(args: JsonArgs) -> anyhow::Result<()> {
    let bundle = read_bundle(&args.in_path)?;
    let graph = bundle.graph();

    fieldframe::write_fields_json(&graph, args.faction.into(), &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
