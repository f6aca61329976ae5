use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::prelude::*;

mod cli;

#[derive(Parser)]
#[command(name = "pk")]
#[command(about = "Small terminal utilities behind one binary")]
struct Cli {
    /// Lower log verbosity (repeat for less)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command in a fresh pty wired to this terminal
    Relay(RelayArgs),
    /// Count down the given duration, printing the remaining seconds
    Countdown(CountdownArgs),
    /// Complementary color of an rgb hex color
    ColorComplement(ColorArgs),
    /// Inverted rgb hex color
    ColorInvert(ColorArgs),
    /// Write stdin to a file, skipping the write when nothing changed
    Sponge(SpongeArgs),
}

#[derive(Parser)]
struct RelayArgs {
    /// Command to run; end the session by typing ~ then .
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[derive(Parser)]
struct CountdownArgs {
    /// Seconds, or units like "3hour 4min 5sec"
    #[arg(value_parser = cli::countdown::parse_duration_secs)]
    duration: u64,
}

#[derive(Parser)]
struct ColorArgs {
    /// Hex color like "#22aa66"; read from stdin when omitted
    color: Option<String>,
}

#[derive(Parser)]
struct SpongeArgs {
    /// Destination file
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Commands::Relay(args) => {
            let code = cli::relay::relay_command(args.command).await?;
            std::process::exit(code)
        }
        Commands::Countdown(args) => cli::countdown::countdown_command(args.duration).await,
        Commands::ColorComplement(args) => cli::color::color_complement_command(args.color),
        Commands::ColorInvert(args) => cli::color::color_invert_command(args.color),
        Commands::Sponge(args) => cli::sponge::sponge_command(&args.file),
    }
}

/// Map repeated -q flags onto an env-filter default. RUST_LOG still wins.
/// Logs go to stderr so they never mix with relayed child output.
fn init_tracing(quiet: u8) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives(quiet)));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Filter targets are crate names: this binary compiles as `pk`, not
/// `pocketknife`.
fn default_directives(quiet: u8) -> &'static str {
    match quiet {
        0 => "pk=info,pty_relay=info",
        1 => "pk=warn,pty_relay=warn",
        2 => "pk=error,pty_relay=error",
        _ => "off",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_name_the_compiled_crates() {
        let bin_crate = module_path!().split("::").next().unwrap();
        for quiet in 0..=2 {
            let directives = default_directives(quiet);
            assert!(
                directives.contains(&format!("{bin_crate}=")),
                "{directives:?} never matches events from this binary"
            );
            assert!(directives.contains("pty_relay="));
        }
    }

    #[test]
    fn extra_quiet_flags_disable_logging() {
        assert_eq!(default_directives(3), "off");
        assert_eq!(default_directives(255), "off");
    }
}
