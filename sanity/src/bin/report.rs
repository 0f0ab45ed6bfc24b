use packer::*;
use sanity::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Runs one input against several accuracy parameters
/// in parallel, and audits every resulting schedule.
#[derive(Parser, Debug)]
struct Arg {
    /// Path to input (one size per line), or - for stdin
    #[arg(value_parser = clap::value_parser!(PathBuf))]
    input:      PathBuf,

    /// Number of identical machines
    #[arg(short, long)]
    machines:   usize,

    /// Comma-separated accuracy parameters
    #[arg(short, long, value_delimiter = ',', num_args = 1.., required = true)]
    eps:        Vec<Size>,

    /// Cap on cover search states per packing
    #[arg(long, default_value_t = DEFAULT_MAX_STATES)]
    max_states: usize,

    /// Pretty-print each record
    #[arg(short, long, default_value_t = false)]
    pretty:     bool,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Record {
    Ok(Report),
    Failed {
        eps:    Size,
        stage:  String,
        error:  String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Arg::parse();
    let sizes = SizeListParser::new(cli.input).read_sizes()?;
    let queries: Vec<(usize, Size)> = cli.eps
        .iter()
        .map(|&e| (cli.machines, e))
        .collect();

    let total = Instant::now();
    let results = sweep(&sizes, &queries, &Budget::new(cli.max_states), &SearchConfig::default());
    let elapsed = total.elapsed();

    let mut invalid = 0;
    for (&eps, res) in cli.eps.iter().zip(results) {
        let record = match res {
            Ok(s)   => {
                let r = audit(&sizes, &s, cli.machines, eps);
                if !r.is_valid() {
                    invalid += 1;
                }
                Record::Ok(r)
            },
            Err(e)  => Record::Failed {
                eps,
                stage:  e.stage().to_string(),
                error:  e.to_string(),
            },
        };
        let line = if cli.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        println!("{line}");
    }
    eprintln!("Total sweep time: {} μs", elapsed.as_micros());
    anyhow::ensure!(invalid == 0, "{invalid} schedule(s) failed the audit");

    Ok(())
}
