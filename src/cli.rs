use crate::config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};

// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
#[derive(Parser)]
#[command(name = "kubevalidator", version, about = "Validate Kubernetes manifests against JSON schemas", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: KUBEVALIDATOR_LOG=] [default: info]
    #[arg(
        long,
        env = "KUBEVALIDATOR_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter .github/kubevalidator.yaml
    Init(InitArgs),
    /// Validate manifests against the schemas mapped to them
    Validate(ValidateArgs),
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Override existing config file
    #[arg(long)]
    pub r#override: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Files to validate, relative to --root. When empty, files changed
    /// against --base are used
    pub files: Vec<String>,

    /// Base commit to compare against.
    /// Examples: HEAD^ or ^, HEAD~1 or ~1, commit hash, @{1.day.ago}.
    /// HEAD for uncommitted changes, ROOT for all files
    /// [default: HEAD if uncommitted changes exist, otherwise ^]
    #[arg(
        long,
        default_value = "",
        hide_default_value = true,
        verbatim_doc_comment
    )]
    pub base: String,

    /// Path to config file (initialize with `kubevalidator init`)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Directory manifests are loaded from
    #[arg(long, default_value = ".")]
    pub root: String,

    /// Read schemas from a local kubernetes-json-schema checkout instead of HTTP
    #[arg(long)]
    pub schema_dir: Option<String>,

    /// Output file path (.md or .json)
    #[arg(long)]
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = Cli::parse_from([
            "kubevalidator",
            "validate",
            "config/a.yaml",
            "config/b.yaml",
            "--schema-dir",
            "/schemas",
            "--output",
            "report.json",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.log_level, "debug");
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.files, vec!["config/a.yaml", "config/b.yaml"]);
        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
        assert_eq!(args.root, ".");
        assert_eq!(args.base, "");
        assert_eq!(args.schema_dir.as_deref(), Some("/schemas"));
        assert_eq!(args.output.as_deref(), Some("report.json"));
    }

    #[test]
    fn test_parse_init() {
        let cli = Cli::parse_from(["kubevalidator", "init", "--override"]);
        let Commands::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert!(args.r#override);
        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
    }
}
