use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use topology_resolver::render;
use topology_resolver::spec::{self, GroupTable, PolicySpec};
use topology_resolver::{Result, Severity, resolve_group, resolve_topology};

#[derive(Parser)]
#[command(name = "topology-resolver")]
#[command(about = "Resolve and validate nested host-group inventories", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Inventory JSON file; repeat to concatenate several files in order.
    #[arg(short, long = "inventory", required = true)]
    inventory: Vec<PathBuf>,

    /// Policy JSON file, replacing any policy embedded in the inventory.
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum)]
enum Format {
    Json,
    Ini,
}

#[derive(Copy, Clone, ValueEnum)]
enum FailOn {
    Error,
    Warning,
    Never,
}

impl FailOn {
    fn threshold(self) -> Option<Severity> {
        match self {
            FailOn::Error => Some(Severity::Error),
            FailOn::Warning => Some(Severity::Warning),
            FailOn::Never => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the resolved topology (diagnostics are logged).
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        /// Output file; stdout when omitted.
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "error")]
        fail_on: FailOn,
    },
    /// Validate only and print the diagnostics.
    Check {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, value_enum, default_value = "error")]
        fail_on: FailOn,
    },
    /// Print the hosts of one group, one per line.
    Hosts {
        #[command(flatten)]
        input: InputArgs,

        group: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Commands::Report {
            input,
            format,
            out,
            fail_on,
        } => {
            let (declarations, policy) = load_input(&input)?;
            let report = resolve_topology(&declarations, &policy)?;
            for d in &report.diagnostics {
                match d.severity {
                    Severity::Error => error!("{}", d),
                    Severity::Warning => warn!("{}", d),
                }
            }

            let text = match format {
                Format::Json => render::render_json_report(&report)?,
                Format::Ini => render::render_ini_inventory(&report),
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    eprintln!("Wrote {}", path.display());
                }
                None => print!("{}", text),
            }

            Ok(exit_code(report.fails(fail_on.threshold())))
        }
        Commands::Check { input, fail_on } => {
            let (declarations, policy) = load_input(&input)?;
            let report = resolve_topology(&declarations, &policy)?;
            print!("{}", render::render_diagnostics(&report.diagnostics));
            Ok(exit_code(report.fails(fail_on.threshold())))
        }
        Commands::Hosts { input, group } => {
            let (declarations, _) = load_input(&input)?;
            let table = GroupTable::load(&declarations)?;
            let Some(resolved) = resolve_group(&table, &group) else {
                anyhow::bail!("group '{}' is not declared", group);
            };
            for d in &resolved.diagnostics {
                warn!("{}", d);
            }
            for host in &resolved.hosts {
                println!("{}", host);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_input(input: &InputArgs) -> Result<(Vec<spec::Declaration>, PolicySpec)> {
    let loaded = spec::load_inventories(input.inventory.as_slice())?;
    let policy = spec::select_policy(loaded.policy, input.policy.as_deref())?;
    Ok((loaded.declarations, policy))
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
