use facet::Facet;
use figue as args;
use sillage::{
    Arguments, CallGraph, GraphSnapshot, GraphvizRenderer, ImageFormat, Outcome, RenderOptions,
    SnapshotRecorder, TableText, Tabulated, Traced, render_call_graph,
};
use std::fmt::Display;
use std::io::BufRead;
use std::path::PathBuf;
#[cfg(unix)]
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::info;

mod algorithms;
mod animate;
mod input;

use algorithms::DP_TABLE;
use animate::Animation;

type AnyResult<T> = Result<T, String>;

const OUT_ENV: &str = "SILLAGE_OUT";

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    /// Where to write the call graph image.
    #[facet(args::named, default)]
    out: Option<String>,
    /// png, svg, pdf or dot.
    #[facet(args::named, default)]
    format: Option<String>,
    #[facet(args::named, default)]
    hide_null_returns: bool,
    /// Print the call graph and tables as JSON instead of animating.
    #[facet(args::named, default)]
    json: bool,
    #[facet(args::named, default)]
    no_animate: bool,
    /// Stop the animation after this many frames.
    #[facet(args::named, default)]
    frames: Option<u32>,
    /// Open the rendered image with the system viewer.
    #[facet(args::named, default)]
    open: bool,
    #[facet(args::subcommand)]
    command: Problem,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum Problem {
    Fib {
        #[facet(args::named)]
        n: usize,
    },
    Binom {
        #[facet(args::named)]
        n: usize,
        #[facet(args::named)]
        k: usize,
    },
    Lis {
        /// Comma-separated integers, e.g. `3,1,4,1,5`.
        #[facet(args::named)]
        sequence: String,
    },
    EditDistance {
        #[facet(args::named)]
        from: String,
        #[facet(args::named)]
        to: String,
    },
}

impl Problem {
    fn slug(&self) -> &'static str {
        match self {
            Self::Fib { .. } => "fib",
            Self::Binom { .. } => "binom",
            Self::Lis { .. } => "lis",
            Self::EditDistance { .. } => "edit-distance",
        }
    }
}

struct Config {
    out: PathBuf,
    options: RenderOptions,
    json: bool,
    animate: bool,
    frames: Option<u32>,
    open: bool,
}

/// Everything one visualisation produced, as printed by `--json`.
#[derive(Facet)]
struct Report {
    problem: String,
    recursive_result: String,
    recursive_ms: f64,
    tabulated_result: String,
    tabulated_ms: f64,
    call_graph: GraphSnapshot,
    tables: Vec<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> AnyResult<()> {
    let cli = parse_cli()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = config_from_cli(&cli)?;
    let graph = CallGraph::new();
    dispatch_problem(&cfg, &graph, cli.command)
}

fn parse_cli() -> AnyResult<Cli> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("sillage-examples")
                .description("Trace recursive and tabulated dynamic-programming solutions")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();

    args::Driver::new(figue_config)
        .run()
        .into_result()
        .map(|v| v.value)
        .map_err(|e| e.to_string())
}

fn config_from_cli(cli: &Cli) -> AnyResult<Config> {
    let format = match cli.format.as_deref() {
        Some(name) => name.parse::<ImageFormat>().map_err(|e| e.to_string())?,
        None => ImageFormat::default(),
    };
    let out = output_path(
        cli.out.as_deref(),
        std::env::var(OUT_ENV).ok(),
        cli.command.slug(),
        format,
    );

    Ok(Config {
        out,
        options: RenderOptions {
            format,
            show_null_returns: !cli.hide_null_returns,
            ..RenderOptions::default()
        },
        json: cli.json,
        animate: !cli.no_animate && !cli.json,
        frames: input::check_frames(cli.frames)?,
        open: cli.open,
    })
}

fn output_path(
    cli_out: Option<&str>,
    env_out: Option<String>,
    slug: &str,
    format: ImageFormat,
) -> PathBuf {
    cli_out
        .map(PathBuf::from)
        .or_else(|| env_out.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(format!("sillage-{slug}.{}", format.extension())))
}

fn dispatch_problem(cfg: &Config, graph: &CallGraph, problem: Problem) -> AnyResult<()> {
    match problem {
        Problem::Fib { n } => {
            let n = input::check_size("n", n)?;
            visualize(cfg, graph, "fib", (&algorithms::FIB, n), (&algorithms::FIB_ITER, n))
        }
        Problem::Binom { n, k } => {
            let args = input::check_binom(n, k)?;
            visualize(
                cfg,
                graph,
                "binom",
                (&algorithms::BINOM, args),
                (&algorithms::BINOM_ITER, args),
            )
        }
        Problem::Lis { sequence } => {
            let sequence = input::parse_sequence(&sequence)?;
            visualize(
                cfg,
                graph,
                "lis",
                (&algorithms::LIS, sequence.clone()),
                (&algorithms::LIS_ITER, sequence),
            )
        }
        Problem::EditDistance { from, to } => {
            let words = input::check_words(&from, &to)?;
            visualize(
                cfg,
                graph,
                "edit-distance",
                (&algorithms::EDIT_DISTANCE, words.clone()),
                (&algorithms::EDIT_DISTANCE_ITER, words),
            )
        }
    }
}

/// Traces the recursive form, renders its call graph, then runs the
/// tabulated form and animates its table.
fn visualize<A, R, B, T, S>(
    cfg: &Config,
    graph: &CallGraph,
    problem: &str,
    (recursive, recursive_args): (&Traced<A, R>, A),
    (tabulated, tabulated_args): (&Tabulated<B, T, S>, B),
) -> AnyResult<()>
where
    A: Arguments,
    R: Outcome + Display,
    T: TableText + Clone + PartialEq + Send + Sync + 'static,
    S: Display,
{
    graph.reset();
    let started = Instant::now();
    let recursive_result = graph.trace(recursive, recursive_args);
    let recursive_elapsed = started.elapsed();
    info!(
        function = recursive.name(),
        activations = graph.len(),
        elapsed_ms = millis(recursive_elapsed),
        "recursive run finished"
    );

    let snapshot = graph.snapshot();
    let image = render_call_graph(&snapshot, &GraphvizRenderer::from_env(), &cfg.options)
        .map_err(|e| format!("failed to render call graph: {e}"))?;
    std::fs::write(&cfg.out, image)
        .map_err(|e| format!("failed to write {}: {e}", cfg.out.display()))?;
    info!(path = %cfg.out.display(), format = %cfg.options.format, "call graph written");
    if cfg.open {
        open_image(&cfg.out);
    }

    let recorder = SnapshotRecorder::<T>::new(DP_TABLE);
    let started = Instant::now();
    let tabulated_result = recorder.run(tabulated, tabulated_args);
    let tabulated_elapsed = started.elapsed();
    info!(
        function = tabulated.name(),
        snapshots = recorder.len(),
        elapsed_ms = millis(tabulated_elapsed),
        "tabulated run finished"
    );

    if cfg.json {
        let report = Report {
            problem: problem.to_owned(),
            recursive_result: recursive_result.to_string(),
            recursive_ms: millis(recursive_elapsed),
            tabulated_result: tabulated_result.to_string(),
            tabulated_ms: millis(tabulated_elapsed),
            call_graph: snapshot,
            tables: recorder
                .snapshots()
                .iter()
                .map(TableText::table_text)
                .collect(),
        };
        println!(
            "{}",
            facet_json::to_string_pretty(&report).map_err(|e| format!("encode report: {e}"))?
        );
        return Ok(());
    }

    println!(
        "{}: {recursive_result} ({:.3} ms, {} calls, graph in {})",
        recursive.name(),
        millis(recursive_elapsed),
        snapshot.nodes.len(),
        cfg.out.display()
    );
    println!(
        "{}: {tabulated_result} ({:.3} ms, {} tables)",
        tabulated.name(),
        millis(tabulated_elapsed),
        recorder.len()
    );

    if !cfg.animate {
        if let Some(last) = recorder.sequence().last() {
            println!("{}", last.table_text());
        }
        return Ok(());
    }

    let animation = Animation::spawn(
        recorder.sequence(),
        format!("{} {DP_TABLE}", tabulated.name()),
        cfg.frames,
    );
    if cfg.frames.is_some() {
        animation.wait();
    } else {
        eprintln!("press Enter to stop");
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        animation.stop();
    }
    Ok(())
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn open_image(path: &std::path::Path) {
    #[cfg(target_os = "macos")]
    {
        let _ = Command::new("open")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        let _ = Command::new("xdg-open")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }
}
