use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kp_contracts::{
    KP_RT_ABI_REPORT_SCHEMA_VERSION, KP_RT_ABI_VERSION, KP_RT_CONFIG_SCHEMA_VERSION,
};
use kp_profiles::ProfileId;
use kp_runtime::prims::LIFECYCLE_DECLARES;
use kp_runtime::{RuntimeConfig, PRIMITIVES};
use tracing_subscriber::EnvFilter;

mod call;

#[derive(Parser, Debug)]
#[command(name = "kp-rt")]
#[command(about = "Drive kforth runtime primitives from the command line.", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct ConfigArgs {
    /// Runtime profile (overrides KP_RT_PROFILE and the config file).
    #[arg(long, value_enum)]
    profile: Option<ProfileId>,

    /// JSON runtime config file (defaults to KP_RT_CONFIG).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<RuntimeConfig> {
        RuntimeConfig::resolve(self.profile, self.config.as_deref())
            .context("resolve runtime config")
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one primitive on a fresh runtime bound to stdin/stdout.
    Call(call::CallArgs),

    /// List the exported primitives.
    Abi {
        #[arg(long, value_enum, default_value_t = AbiFormat::Json)]
        format: AbiFormat,
    },

    /// Print the resolved runtime configuration.
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AbiFormat {
    Json,
    /// `declare` lines for an LLVM IR module.
    Llvm,
}

fn main() -> ExitCode {
    init_tracing();
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    // stdout belongs to the runtime; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kp_rt=warn,kp_runtime=warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Call(args) => call::run(args),
        Command::Abi { format } => {
            print_abi(format)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { config } => {
            let resolved = config.resolve()?;
            let doc = serde_json::json!({
                "schema_version": KP_RT_CONFIG_SCHEMA_VERSION,
                "config": resolved,
                "caps": resolved.caps(),
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_abi(format: AbiFormat) -> Result<()> {
    match format {
        AbiFormat::Json => {
            let doc = serde_json::json!({
                "schema_version": KP_RT_ABI_REPORT_SCHEMA_VERSION,
                "abi_version": KP_RT_ABI_VERSION,
                "lifecycle": LIFECYCLE_DECLARES,
                "primitives": PRIMITIVES,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        AbiFormat::Llvm => {
            println!("; kp-runtime ABI v{KP_RT_ABI_VERSION}");
            for line in LIFECYCLE_DECLARES {
                println!("{line}");
            }
            for spec in PRIMITIVES {
                println!("{}", spec.llvm_declare());
            }
        }
    }
    Ok(())
}
