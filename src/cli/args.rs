//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Content-hash versioning for static assets
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: rev.toml)
    #[arg(short = 'C', long, default_value = "rev.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Version the sources once and write the manifest
    #[command(visible_alias = "v")]
    Version {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Version the sources, then again whenever one of them changes
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: RunArgs,
    },
}

/// Shared arguments for Version and Watch commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Files, directories or globs to version, relative to the public root.
    /// Prefix with `./` for paths relative to the project root.
    /// Overrides `[version] sources` when given.
    #[arg(value_name = "SOURCES")]
    pub sources: Vec<String>,

    /// Output directory (relative to project root).
    /// Default: `<paths.public>/<paths.build_folder>`
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<String>,

    /// Extra file, directory or glob copied into the output without versioning.
    /// Repeatable. Overrides `[version] assets` when given.
    #[arg(short, long = "asset", value_name = "ASSET")]
    pub assets: Vec<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch { .. })
    }

    pub const fn run_args(&self) -> &RunArgs {
        match &self.command {
            Commands::Version { args } | Commands::Watch { args } => args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tola-rev").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_version_with_sources_and_assets() {
        let cli = parse(&["version", "css/*.css", "js/app.js", "-o", "public/assets", "-a", "fonts", "--asset", "img/*.png"]);

        assert!(!cli.is_watch());
        let args = cli.run_args();
        assert_eq!(args.sources, vec!["css/*.css", "js/app.js"]);
        assert_eq!(args.output.as_deref(), Some("public/assets"));
        assert_eq!(args.assets, vec!["fonts", "img/*.png"]);
        assert!(!args.verbose);
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["watch", "-V"]);
        assert!(cli.is_watch());
        assert_eq!(cli.config, PathBuf::from("rev.toml"));
        assert!(cli.run_args().sources.is_empty());
        assert!(cli.run_args().verbose);
    }

    #[test]
    fn test_global_options() {
        let cli = parse(&["-C", "site/rev.toml", "v", "--color", "never"]);
        assert_eq!(cli.config, PathBuf::from("site/rev.toml"));
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tola-rev"]).is_err());
    }
}
