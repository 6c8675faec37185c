//! Command-line driver for the Golomb ruler search engine
//!
//! Parses flags into an immutable [`EngineConfig`], runs the minimization
//! loop, and reports the result on stdout and into a result file. Crashes
//! are caught and logged with a backtrace so batch runs leave a trace.

use chrono::Local;
use clap::Parser;
use golomb_engine::config::{CheckpointConfig, EngineConfig};
use golomb_engine::search::{GolombSolver, Solution};
use golomb_engine::types::{Ruler, SolveMode, MAX_MARKS};
use golomb_engine::reference;
use std::any::Any;
use std::backtrace::Backtrace;
use std::fs;
use std::io::Write as _;
use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Finds an optimal Golomb ruler with the given number of marks
#[derive(Parser, Debug)]
#[command(name = "golomb")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of marks (2-32)
    n: u32,

    /// Force the single-threaded solver
    #[arg(short = 's', long)]
    single: bool,

    /// Use the task-queue parallel solver instead of the ordered one
    #[arg(short = 'd', long, conflicts_with = "single")]
    tasks: bool,

    /// Use the ordered parallel solver explicitly (this is the default)
    #[arg(long, conflicts_with_all = ["single", "tasks"])]
    parallel: bool,

    /// Start from the best-known length instead of the lower bound
    #[arg(short = 'b', long)]
    heuristic_start: bool,

    /// Force-enable SIMD probes even when the build default is off
    #[arg(short = 'e', long)]
    simd: bool,

    /// Disable SIMD probes
    #[arg(long, conflicts_with = "simd")]
    no_simd: bool,

    /// Worker thread count (default: all cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Save and resume progress at this file (ordered parallel solver)
    #[arg(short = 'f', long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    /// Checkpoint flush interval in seconds
    #[arg(long, default_value_t = 60, value_name = "SECS")]
    checkpoint_interval: u64,

    /// Write the found ruler to this file (default: out/GOL_n<N>.txt)
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print a progress heartbeat every so many minutes (0 = off)
    #[arg(long, default_value_t = 0.0, value_name = "MINUTES")]
    heartbeat: f64,

    /// Enable verbose output during search
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    env_logger::init();
    install_panic_hook();
    install_signal_handlers();
    let cli = Cli::parse();
    let code = run_with_panic_logging(|| run(&cli));
    process::exit(code);
}

fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        eprintln!("[engine panic] {}\n{}", info, Backtrace::force_capture());
    }));
}

fn run_with_panic_logging<F>(f: F) -> i32
where
    F: FnOnce() -> i32 + UnwindSafe,
{
    match panic::catch_unwind(f) {
        Ok(code) => code,
        Err(payload) => {
            let msg = format_panic_payload(&payload);
            eprintln!("[engine panic] unhandled panic payload: {}", msg);
            // Non-zero exit so the caller knows the engine died.
            101
        }
    }
}

fn format_panic_payload(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown payload type".to_string()
    }
}

#[cfg(unix)]
unsafe extern "C" fn signal_handler(
    signal: libc::c_int,
    _info: *mut libc::siginfo_t,
    _context: *mut libc::c_void,
) {
    let backtrace = Backtrace::force_capture();
    eprintln!("[engine signal] received {}, capturing backtrace\n{}", signal, backtrace);
    libc::_exit(128 + signal);
}

#[cfg(unix)]
fn install_signal_handlers() {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = signal_handler as usize;
        action.sa_flags = libc::SA_SIGINFO | libc::SA_ONSTACK | libc::SA_RESETHAND;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGSEGV, &action, std::ptr::null_mut());
        libc::sigaction(libc::SIGABRT, &action, std::ptr::null_mut());
    }
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

fn run(cli: &Cli) -> i32 {
    if cli.n < 2 || cli.n > MAX_MARKS as u32 {
        eprintln!("Marks must be between 2 and {}.", MAX_MARKS);
        return 1;
    }

    let mut config = EngineConfig::default();
    if let Some(threads) = cli.threads {
        config.search.threads = threads;
    }
    config.search.heuristic_start = cli.heuristic_start;
    config.search.debug_logging = cli.verbose;
    if cli.simd {
        config.simd.enable_simd = true;
    }
    if cli.no_simd {
        config.simd.enable_simd = false;
    }
    config.checkpoint = CheckpointConfig {
        path: cli.checkpoint.clone(),
        interval_secs: cli.checkpoint_interval.max(1),
    };
    config.apply_env();

    let mode = if cli.single {
        SolveMode::SingleThread
    } else if cli.tasks {
        SolveMode::Tasks
    } else {
        SolveMode::Parallel
    };

    let solver = match GolombSolver::new(mode, config) {
        Ok(solver) => solver,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    println!("Start time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("[Info] Solver: {}", mode);
    println!("[Info] Distance duplicate test implementation: {}", solver.probe_backend());

    if cli.verbose {
        if let Some(r) = reference::lookup_by_marks(cli.n) {
            println!("Reference optimal ruler from table:");
            println!("{}", r);
        }
    }

    let started = Instant::now();
    let current_length = Arc::new(AtomicU32::new(0));
    let done = Arc::new(AtomicBool::new(false));
    let heartbeat = spawn_heartbeat(cli.heartbeat, started, &current_length, &done);

    let outcome = solver.solve_order_observed(cli.n, Some(current_length.as_ref()));

    done.store(true, Ordering::Release);
    if let Some(handle) = heartbeat {
        let _ = handle.join();
    }

    let solution = match outcome {
        Ok(Some(solution)) => solution,
        Ok(None) => {
            eprintln!("Could not find a Golomb ruler with {} marks within length limit.", cli.n);
            return 1;
        }
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let elapsed = started.elapsed().as_secs_f64();
    let elapsed_fmt = format_elapsed(elapsed);
    println!("End time:   {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Found ruler: {}", solution.ruler);
    println!("Elapsed time: {}", elapsed_fmt);
    report_distances(&solution.ruler);

    let options = option_string(cli);
    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("out/GOL_n{}{}.txt", cli.n, file_suffix(cli))));
    if let Err(e) = write_result_file(&path, &solution, elapsed, &elapsed_fmt, &options) {
        eprintln!("Failed to write result file '{}': {}", path.display(), e);
    }

    match solution.optimal {
        Some(optimal) => {
            println!("Status: {}", if optimal { "optimal" } else { "not optimal" });
            i32::from(!optimal)
        }
        None => {
            println!("No comparison possible (order missing from reference table).");
            0
        }
    }
}

/// Background printer of elapsed time and the length currently searched
fn spawn_heartbeat(
    minutes: f64,
    started: Instant,
    current_length: &Arc<AtomicU32>,
    done: &Arc<AtomicBool>,
) -> Option<thread::JoinHandle<()>> {
    if minutes <= 0.0 {
        return None;
    }
    let interval = Duration::from_secs_f64(minutes * 60.0);
    let current_length = Arc::clone(current_length);
    let done = Arc::clone(done);
    Some(thread::spawn(move || {
        let mut next_beat = interval;
        while !done.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(250));
            if started.elapsed() < next_beat {
                continue;
            }
            next_beat += interval;
            let length = current_length.load(Ordering::Relaxed);
            if length > 0 {
                println!("[VT] {} elapsed - current L={}", format_elapsed(started.elapsed().as_secs_f64()), length);
            }
        }
    }))
}

/// Format seconds as h:mm:ss.mmm, mm:ss.mmm, or s.mmm
fn format_elapsed(sec: f64) -> String {
    let hours = (sec / 3600.0) as u64;
    let minutes = ((sec - hours as f64 * 3600.0) / 60.0) as u64;
    let seconds = sec - hours as f64 * 3600.0 - minutes as f64 * 60.0;
    if hours > 0 {
        format!("{}:{:02}:{:06.3}", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{:02}:{:06.3}", minutes, seconds)
    } else {
        format!("{:.3} s", seconds)
    }
}

fn report_distances(ruler: &Ruler) {
    let distances = ruler.distances();
    let missing = ruler.missing_distances();
    println!("Distances ({}): {}", distances.len(), join(&distances));
    println!("Missing ({}): {}", missing.len(), join(&missing));
}

fn join(values: &[u32]) -> String {
    values.iter().map(u32::to_string).collect::<Vec<_>>().join(" ")
}

/// Flag summary recorded in the result file
fn option_string(cli: &Cli) -> String {
    let mut opts: Vec<&str> = Vec::new();
    if cli.single {
        opts.push("-s");
    } else if cli.tasks {
        opts.push("-d");
    } else if cli.parallel {
        opts.push("--parallel");
    }
    if cli.heuristic_start {
        opts.push("-b");
    }
    if cli.simd {
        opts.push("-e");
    }
    if cli.verbose {
        opts.push("-v");
    }
    opts.join(" ")
}

/// Matching suffix for the default result filename
fn file_suffix(cli: &Cli) -> String {
    let mut suffix = String::new();
    if cli.single {
        suffix.push_str("_s");
    } else if cli.tasks {
        suffix.push_str("_d");
    } else if cli.parallel {
        suffix.push_str("_mp");
    }
    if cli.heuristic_start {
        suffix.push_str("_b");
    }
    if cli.simd {
        suffix.push_str("_e");
    }
    if cli.verbose {
        suffix.push_str("_v");
    }
    suffix
}

fn write_result_file(
    path: &Path,
    solution: &Solution,
    elapsed: f64,
    elapsed_fmt: &str,
    options: &str,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let ruler = &solution.ruler;
    let mut file = fs::File::create(path)?;
    writeln!(file, "length={}", ruler.length())?;
    writeln!(file, "marks={}", ruler.order())?;
    writeln!(file, "positions={}", join(ruler.positions()))?;
    writeln!(file, "distances={}", join(&ruler.distances()))?;
    writeln!(file, "missing={}", join(&ruler.missing_distances()))?;
    writeln!(file, "seconds={:.6}", elapsed)?;
    writeln!(file, "time={}", elapsed_fmt)?;
    writeln!(file, "options={}", if options.is_empty() { "none" } else { options })?;
    if let Some(optimal) = solution.optimal {
        writeln!(file, "optimal={}", if optimal { "yes" } else { "no" })?;
    }
    Ok(())
}
