use clap::{App, Arg, ArgMatches};
use mandelbrot::{GridSpec, PipelineConfig, RenderError};
use std::io::{self, BufWriter};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_positive(s: &str, what: &str) -> Result<(), String> {
    validate_range(
        s,
        1,
        u32::max_value(),
        &format!("Could not parse {}", what),
        &format!("{} must be at least 1", what),
    )
}

const ROWS: &str = "rows";
const COLS: &str = "cols";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const PIN: &str = "pin";
const PGM: &str = "pgm";

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandel")
        .version("0.1.0")
        .about("Mandelbrot renderer on a lock-free feeder/worker/collector pipeline")
        .after_help(
            "When --rows, --cols and --iterations are all omitted, the three \
             numbers are read from standard input instead.",
        )
        .arg(
            Arg::with_name(ROWS)
                .long(ROWS)
                .short("r")
                .takes_value(true)
                .validator(|s| validate_positive(&s, "row count"))
                .help("Number of rows in the image"),
        )
        .arg(
            Arg::with_name(COLS)
                .long(COLS)
                .short("c")
                .takes_value(true)
                .validator(|s| validate_positive(&s, "column count"))
                .help("Number of columns in the image"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .validator(|s| validate_positive(&s, "iteration limit"))
                .help("Maximum number of iterations per cell"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .env("MAX_CPUS")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        mandelbrot::pipeline::MAX_WORKERS,
                        "Could not parse thread count",
                        &format!(
                            "Thread count must be between 1 and {}",
                            mandelbrot::pipeline::MAX_WORKERS
                        ),
                    )
                })
                .help("Number of worker threads (defaults to one per CPU)"),
        )
        .arg(
            Arg::with_name(PIN)
                .long(PIN)
                .help("Pin feeder, workers and collector to separate cores"),
        )
        .arg(
            Arg::with_name(PGM)
                .long(PGM)
                .short("o")
                .takes_value(true)
                .help("Also write the image as a binary PGM to this file"),
        )
        .get_matches()
}

fn number<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).and_then(|s| T::from_str(s).ok())
}

fn grid(matches: &ArgMatches) -> Result<GridSpec, RenderError> {
    let given = [ROWS, COLS, ITERATIONS]
        .iter()
        .filter(|name| matches.is_present(name))
        .count();
    match given {
        0 => {
            let stdin = io::stdin();
            GridSpec::from_reader(stdin.lock())
        }
        3 => match (
            number::<u32>(matches, ROWS),
            number::<u32>(matches, COLS),
            number::<u32>(matches, ITERATIONS),
        ) {
            (Some(rows), Some(cols), Some(limit)) => GridSpec::new(rows, cols, limit),
            _ => Err(RenderError::Input("could not parse grid arguments".to_string())),
        },
        _ => Err(RenderError::Input(
            "--rows, --cols and --iterations must be given together".to_string(),
        )),
    }
}

fn run(matches: &ArgMatches) -> Result<(), RenderError> {
    let grid = grid(matches)?;
    let mut config = PipelineConfig::new().pin_threads(matches.is_present(PIN));
    if let Some(threads) = number::<usize>(matches, THREADS) {
        config = config.workers(threads);
    }

    let rendered = mandelbrot::render(&grid, &config)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    mandelbrot::output::write_ascii(&rendered.image, &mut out)?;
    if let Some(path) = matches.value_of(PGM) {
        mandelbrot::output::write_pgm(&rendered.image, path)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        error!("Render failure: {}", e);
        std::process::exit(1);
    }
}
