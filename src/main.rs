use clap::{Parser, Subcommand};
use relgate::core::error::print_error;
use relgate::commands::{self, CheckArgs};
use std::path::PathBuf;

/// Validate release-metadata documents before they merge
#[derive(Parser)]
#[command(name = "relgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate deliverable files against the registered rules
  Check {
    /// Deliverable files to validate (default: every file in the current
    /// series directory)
    files: Vec<PathBuf>,
    /// Directory holding one subdirectory of deliverable files per series
    #[arg(long, default_value = "deliverables")]
    deliverables_root: PathBuf,
    /// Series currently accepting changes (default: newest series directory)
    #[arg(long)]
    current_series: Option<String>,
    /// Base URL repository identifiers are cloned from
    #[arg(long, default_value = "https://git.example.org")]
    remote_base: String,
    /// Team governance table (YAML)
    #[arg(long)]
    team_data: Option<PathBuf>,
    /// Series status table (YAML)
    #[arg(long)]
    series_status: Option<PathBuf>,
    /// Keep the clone cache on disk after the run
    #[arg(long)]
    no_cleanup: bool,
    /// Output the report in JSON format (useful for CI/automation)
    #[arg(long)]
    json: bool,
    /// Number of worker threads (default: one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,
  },
  /// List the registered validation rules
  Rules {
    /// Output the rule table in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Check {
      files,
      deliverables_root,
      current_series,
      remote_base,
      team_data,
      series_status,
      no_cleanup,
      json,
      jobs,
    } => commands::run_check(CheckArgs {
      files,
      deliverables_root,
      current_series,
      remote_base,
      team_data,
      series_status,
      no_cleanup,
      json,
      jobs,
    }),
    Commands::Rules { json } => commands::run_rules_listing(json),
  };

  if let Err(err) = result {
    print_error(&err);
    std::process::exit(err.exit_code().as_i32());
  }
}
