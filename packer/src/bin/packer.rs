use packer::*;
use tracing_subscriber::EnvFilter;

/// Schedules sizes on identical machines via ε-approximate bin packing
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to input (one size per line), or - for stdin
    #[arg(value_parser = clap::value_parser!(PathBuf))]
    input:      PathBuf,

    /// Accuracy parameter, in (0, 1)
    #[arg(short, long)]
    eps:        Size,

    /// Number of identical machines
    #[arg(short, long)]
    machines:   usize,

    /// Packing strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Dual)]
    strategy:   Strategy,

    /// Which bucket edge rounded sizes snap to
    #[arg(short, long, value_enum, default_value_t = Rounding::LowerEdge)]
    rounding:   Rounding,

    /// Seed for the heuristic's tie-breaking
    #[arg(long, default_value_t = 0)]
    seed:       u64,

    /// Cap on cover search states per packing
    #[arg(long, default_value_t = DEFAULT_MAX_STATES)]
    max_states: usize,

    /// Wall-clock cap on each cover search, in milliseconds
    #[arg(long)]
    time_limit_ms:  Option<u64>,

    /// Relative width at which bisection stops
    #[arg(short, long, default_value_t = DEFAULT_REL_TOLERANCE)]
    tolerance:  Size,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Args::parse();
    let sizes = SizeListParser::new(cli.input).read_sizes()?;
    let mut budget = Budget::new(cli.max_states);
    if let Some(ms) = cli.time_limit_ms {
        budget = budget.with_time_limit(Duration::from_millis(ms));
    }
    let mut packer = cli.strategy.build(cli.eps, cli.rounding, budget, cli.seed)?;
    let cfg = SearchConfig::default().with_tolerance(cli.tolerance);

    let lower = items::lower_bound(&items::init(sizes.clone())?, cli.machines.max(1));
    let total = Instant::now();
    let schedule = search(sizes, cli.machines, &mut packer, &cfg)?;
    let elapsed = total.elapsed();

    for bin in &schedule.bins {
        println!("[ {} ]: {}", bin.sizes().iter().join(" "), bin.fill());
    }
    println!(
        "Makespan:\t{}\nLower bound:\t{}\nMax load:\t{}\nMachines used:\t{}/{}\nProbes:\t\t{}",
        schedule.makespan,
        lower,
        schedule.max_load(),
        schedule.machines_used(),
        cli.machines,
        schedule.probes,
    );
    println!("Total packing time: {} μs", elapsed.as_micros());

    Ok(())
}
