mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::Failure;
use kubecfg_store::{ConfigAccess, PathOptions};
use std::path::PathBuf;
use std::process::ExitCode;

const RENAME_CONTEXT_LONG: &str = "Renames a context from the kubeconfig file.

CONTEXT_NAME is the context name that you wish to change.

NEW_NAME is the new name you wish to set.

Note: In case the context being renamed is the 'current-context', this field will also be updated.";

const RENAME_CONTEXT_EXAMPLES: &str = "Examples:
  # Rename the context 'old-name' to 'new-name' in your kubeconfig file
  kubecfg config rename-context old-name new-name";

#[derive(Debug, Parser)]
#[command(name = "kubecfg", version, about = "Edit kubeconfig files")]
struct Cli {
    /// Path to the kubeconfig file to use instead of $KUBECONFIG or ~/.kube/config.
    #[arg(long, global = true, value_name = "FILE")]
    kubeconfig: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Modify kubeconfig files.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Renames a context from the kubeconfig file.
    #[command(
        name = "rename-context",
        override_usage = "kubecfg config rename-context CONTEXT_NAME NEW_NAME",
        long_about = RENAME_CONTEXT_LONG,
        after_help = RENAME_CONTEXT_EXAMPLES
    )]
    RenameContext {
        /// CONTEXT_NAME followed by NEW_NAME.
        #[arg(value_name = "NAME")]
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("KUBECFG_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let access = PathOptions::from_env(cli.kubeconfig);
    tracing::debug!(
        "kubeconfig precedence: {:?} (default {})",
        access.loading_precedence(),
        access.default_filename().display()
    );
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::RenameContext { args } => {
                commands::rename_context::run(&access, &args, json_output)
            }
        },
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(Failure { code, message }) => {
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}
