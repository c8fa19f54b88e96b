use clap::{Parser, Subcommand};
use nextin_core::client::DEFAULT_API_URL;
use nextin_core::report::{ReportOptions, TableStrategy};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "nextin")]
#[command(about = "Website analysis reports from the Nextin Vision service", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the analysis service
    #[arg(long, global = true, env = "NEXTIN_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "NEXTIN_TIMEOUT",
        default_value_t = 60,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Draw the overall score badge without a drop shadow
    #[arg(long, global = true)]
    pub no_shadow: bool,

    /// Always use the fixed grid for report tables
    #[arg(long, global = true)]
    pub grid_tables: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a website and print the report summary
    Analyze {
        /// Website to analyze (http:// or https://)
        url: String,

        #[command(flatten)]
        export: ExportTargets,
    },

    /// Fetch a stored analysis by id
    Show {
        /// Analysis id as listed by `recent`
        id: String,

        /// Website the analysis belongs to, used in exported reports
        #[arg(long)]
        url: Option<String>,

        #[command(flatten)]
        export: ExportTargets,
    },

    /// Re-render a saved JSON export or raw analysis payload
    Export {
        /// Saved analysis JSON
        file: PathBuf,

        /// Website URL; required when the file is a raw payload
        #[arg(long)]
        url: Option<String>,

        /// Write the PDF report here
        #[arg(long, value_name = "PATH")]
        pdf: Option<PathBuf>,

        /// Write a fresh JSON export here
        #[arg(long, value_name = "PATH")]
        json: Option<PathBuf>,
    },

    /// List recently analyzed websites
    Recent,

    /// Check that the analysis service is up
    Health,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportTargets {
    /// Save the complete analysis as JSON
    #[arg(long)]
    pub json: bool,

    /// Save the analysis report as PDF
    #[arg(long)]
    pub pdf: bool,

    /// Directory for exported files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            badge_shadow: !self.no_shadow,
            table_strategy: if self.grid_tables {
                TableStrategy::Grid
            } else {
                TableStrategy::Auto
            },
            ..ReportOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_takes_export_flags() {
        let cli = Cli::try_parse_from([
            "nextin",
            "analyze",
            "https://example.com",
            "--pdf",
            "--out-dir",
            "reports",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze { url, export } => {
                assert_eq!(url, "https://example.com");
                assert!(export.pdf);
                assert!(!export.json);
                assert_eq!(export.out_dir, PathBuf::from("reports"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_shape_report_options() {
        let cli = Cli::try_parse_from([
            "nextin",
            "export",
            "saved.json",
            "--grid-tables",
            "--no-shadow",
            "--timeout",
            "15",
        ])
        .unwrap();

        let options = cli.report_options();
        assert_eq!(options.table_strategy, TableStrategy::Grid);
        assert!(!options.badge_shadow);
        assert_eq!(cli.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["nextin", "health", "--timeout", "0"]).is_err());
    }

    #[test]
    fn analyze_requires_a_url() {
        assert!(Cli::try_parse_from(["nextin", "analyze"]).is_err());
    }
}
