//! efl: inspect how a C++ toolchain is classified.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use commands::Inputs;

#[derive(Parser)]
#[command(name = "efl", version, about = "Build-environment classification for C++ toolchains")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the configuration descriptor
    Resolve {
        #[command(flatten)]
        input: InputArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// Show every matching rule per axis and which one wins
    Explain {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the generated Rust module or Cargo directives
    Emit {
        #[command(flatten)]
        input: InputArgs,
        /// Print `cargo:rustc-cfg` directives instead of the module
        #[arg(long)]
        cfg: bool,
    },
    /// List the classification rule tables
    Rules {
        /// Only this axis
        #[arg(long, value_enum)]
        axis: Option<AxisArg>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// File holding `-dM -E` output (`-` for stdin)
    #[arg(long, conflicts_with = "probe")]
    defines: Option<PathBuf>,
    /// Compiler command to probe (default: $CXX, then c++)
    #[arg(long)]
    probe: Option<String>,
    /// Fail when an axis cannot be resolved
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,
    /// Fall back to UNKNOWN when an axis cannot be resolved
    #[arg(long)]
    lenient: bool,
    /// Pointer size in addressable units
    #[arg(long)]
    pointer_size: Option<u32>,
    /// Bits per addressable unit
    #[arg(long)]
    bits_per_unit: Option<u32>,
    /// Settings file (default: nearest efl.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl From<InputArgs> for Inputs {
    fn from(args: InputArgs) -> Self {
        let strict = match (args.strict, args.lenient) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Inputs {
            defines: args.defines,
            probe: args.probe,
            strict,
            pointer_size: args.pointer_size,
            bits_per_unit: args.bits_per_unit,
            config: args.config,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Human,
    Json,
    Toml,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AxisArg {
    Compiler,
    Platform,
    Arch,
    Standard,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Resolve { input, format } => {
            let format = match format {
                Format::Human => commands::resolve::Format::Human,
                Format::Json => commands::resolve::Format::Json,
                Format::Toml => commands::resolve::Format::Toml,
            };
            commands::resolve::run(&Inputs::from(input), &cwd, format)
        }
        Commands::Explain { input } => commands::explain::run(&Inputs::from(input), &cwd),
        Commands::Emit { input, cfg } => commands::emit::run(&Inputs::from(input), &cwd, cfg),
        Commands::Rules { axis } => {
            let axis = axis.map(|a| match a {
                AxisArg::Compiler => efl_config::Axis::Compiler,
                AxisArg::Platform => efl_config::Axis::Platform,
                AxisArg::Arch => efl_config::Axis::Architecture,
                AxisArg::Standard => efl_config::Axis::Standard,
            });
            commands::rules::run(axis)
        }
    }
}
