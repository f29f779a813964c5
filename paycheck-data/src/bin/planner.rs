use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use paycheck_core::calculations::reference_config;
use paycheck_core::{HsaCoverage, LimitResult, OptimizedJob, TaxYearConfig};
use paycheck_data::{
    HouseholdOptions, HouseholdProjection, JobLoader, JobProjection, JobSpec, YearConfigStore,
    apply_optimized, optimize_household, project_household, write_paychecks_to_file,
};
use rust_decimal::Decimal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Paycheck retirement contribution planner.
///
/// Projects per-paycheck 401(k), HSA, withholding and net pay for the jobs in
/// a CSV file, checks the year's totals against statutory limits, and can
/// propose contribution percentages that use the available annual room.
#[derive(Debug, Parser)]
#[command(name = "paycheck-planner")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory of `<year>.toml` tax year files.
    /// Without it the built-in reference year is used.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Tax year to plan (default: the latest available year).
    #[arg(long, global = true)]
    year: Option<i32>,

    /// HSA coverage tier used for the HSA limit.
    #[arg(long, value_enum, default_value_t = Coverage::Family, global = true)]
    hsa_coverage: Coverage,

    /// Apply the catch-up contribution to the deferral and additions limits.
    #[arg(long, default_value_t = false, global = true)]
    catch_up: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tax years that have configuration.
    Years,

    /// Project every job's paychecks and check the year's limits.
    Project {
        /// Jobs CSV file.
        #[arg(short, long)]
        jobs: PathBuf,

        /// Write every projected paycheck to this CSV file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Propose contribution percentages across the jobs, in file order.
    Optimize {
        /// Jobs CSV file.
        #[arg(short, long)]
        jobs: PathBuf,

        /// Annual HSA target (default: the coverage tier's limit).
        #[arg(long)]
        hsa_target: Option<Decimal>,

        /// Project the proposed percentages and check the year's limits.
        #[arg(short, long, default_value_t = false)]
        project: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Coverage {
    Individual,
    Family,
}

impl From<Coverage> for HsaCoverage {
    fn from(coverage: Coverage) -> Self {
        match coverage {
            Coverage::Individual => HsaCoverage::Individual,
            Coverage::Family => HsaCoverage::Family,
        }
    }
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info`, or `debug` with `--verbose`.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

// ─── configuration ───────────────────────────────────────────────────────────

fn resolve_config(
    config_dir: Option<&Path>,
    year: Option<i32>,
) -> Result<TaxYearConfig> {
    let Some(dir) = config_dir else {
        let config = reference_config();
        if let Some(year) = year.filter(|y| *y != config.tax_year) {
            bail!(
                "No built-in configuration for {year}; pass --config-dir (built-in year is {})",
                config.tax_year
            );
        }
        return Ok(config);
    };

    let mut store = YearConfigStore::new(dir);
    let year = match year {
        Some(year) => year,
        None => store
            .default_year()
            .with_context(|| format!("Failed to discover tax years in: {}", dir.display()))?,
    };

    let config = store
        .get(year)
        .with_context(|| format!("Failed to load configuration for {year}"))?;
    debug!(year, dir = %dir.display(), "using tax year configuration");
    Ok(config.clone())
}

fn load_jobs(path: &Path) -> Result<Vec<JobSpec>> {
    let jobs = JobLoader::load_from_file(path)
        .with_context(|| format!("Failed to load jobs: {}", path.display()))?;
    if jobs.is_empty() {
        bail!("No jobs found in: {}", path.display());
    }
    Ok(jobs)
}

// ─── commands ────────────────────────────────────────────────────────────────

fn list_years(config_dir: Option<&Path>) -> Result<()> {
    let Some(dir) = config_dir else {
        println!("{} (built-in, default)", reference_config().tax_year);
        return Ok(());
    };

    let mut store = YearConfigStore::new(dir);
    let default_year = store
        .default_year()
        .with_context(|| format!("Failed to discover tax years in: {}", dir.display()))?;
    for year in store.available_years()? {
        if *year == default_year {
            println!("{year} (default)");
        } else {
            println!("{year}");
        }
    }

    Ok(())
}

/// Year-end totals for one job; `None` when it has no paychecks.
fn job_summary(job: &JobProjection) -> Option<String> {
    job.last().map(|last| {
        format!(
            "  401(k) YTD {:.2}  HSA YTD {:.2}  match YTD {:.2}  net cash total {:.2}",
            last.ytd_employee_401k,
            last.ytd_hsa,
            last.ytd_match,
            job.total_net_cash()
        )
    })
}

fn print_projection(projection: &HouseholdProjection) {
    for job in &projection.jobs {
        println!("{}: {} paychecks", job.name, job.paychecks.len());
        if let Some(summary) = job_summary(job) {
            println!("{summary}");
        }
    }
    print_limits(&projection.limits);
}

fn print_limits(limits: &LimitResult) {
    if limits.within_limits {
        println!("Limits: within limits");
        return;
    }

    println!("Limits:");
    for warning in &limits.warnings {
        println!("  {warning}");
    }
}

fn print_optimized(optimized: &[OptimizedJob]) {
    for job in optimized {
        let input = &job.contribution_input;
        println!("{}", job.job_name);
        println!(
            "  traditional {}%  roth {}%  after-tax {}%  hsa {}%",
            input.traditional_pct.normalize(),
            input.roth_pct.normalize(),
            input.after_tax_pct.normalize(),
            input.hsa_pct.normalize()
        );
        for note in &job.notes {
            println!("  - {note}");
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_dir = cli.config_dir.as_deref();
    let options = HouseholdOptions {
        hsa_coverage: cli.hsa_coverage.into(),
        catch_up_eligible: cli.catch_up,
    };

    match &cli.command {
        Command::Years => list_years(config_dir)?,
        Command::Project { jobs, output } => {
            let config = resolve_config(config_dir, cli.year)?;
            let jobs = load_jobs(jobs)?;
            println!("Tax year {}, {} jobs", config.tax_year, jobs.len());

            let projection = project_household(&jobs, &config, options);
            print_projection(&projection);

            if let Some(path) = output {
                let written = write_paychecks_to_file(path, projection.paychecks())
                    .with_context(|| format!("Failed to write: {}", path.display()))?;
                println!("Wrote {written} paychecks to {}", path.display());
            }
        }
        Command::Optimize {
            jobs,
            hsa_target,
            project,
        } => {
            let config = resolve_config(config_dir, cli.year)?;
            let jobs = load_jobs(jobs)?;
            println!("Tax year {}, {} jobs", config.tax_year, jobs.len());

            let optimized = optimize_household(&jobs, &config, *hsa_target, options);
            print_optimized(&optimized);

            if *project {
                let applied = apply_optimized(&jobs, &optimized);
                print_projection(&project_household(&applied, &config, options));
            }
        }
    }

    Ok(())
}
