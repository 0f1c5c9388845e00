use clap::{Args, Parser, Subcommand};
use gc_screening::error::AppError;
use std::path::PathBuf;

use crate::demo::{run_demo, DemoArgs};
use crate::report::{run_assess, run_extract};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Gestational Carrier Screening",
    about = "Screen gestational carrier candidates from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Extract and score one candidate's records
    Assess(AssessArgs),
    /// Extract the candidate profile without scoring
    Extract(InputArgs),
    /// Score a set of sample candidates end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

/// Where the candidate's records come from and how far extraction may go.
#[derive(Args, Debug, Default)]
pub(crate) struct InputArgs {
    /// Record files to combine (text, markdown, JSON). Repeat for several documents.
    #[arg(long = "file", short = 'f')]
    pub(crate) files: Vec<PathBuf>,
    /// Inline narrative or JSON profile. Stdin is read when neither this nor --file is given.
    #[arg(long)]
    pub(crate) text: Option<String>,
    /// Allow escalation to the configured external extractor
    #[arg(long)]
    pub(crate) external: bool,
    /// Credential for the external extractor (defaults to SCREENING_EXTERNAL_CREDENTIAL)
    #[arg(long)]
    pub(crate) credential: Option<String>,
    /// Context hint passed to the external extractor. Repeatable.
    #[arg(long = "hint")]
    pub(crate) hints: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    #[command(flatten)]
    pub(crate) input: InputArgs,
    /// Candidate name shown in the report
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Print the full report as JSON instead of a readable summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assess(args) => run_assess(args).await,
        Command::Extract(args) => run_extract(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assess_flags_parse() {
        let cli = Cli::try_parse_from([
            "gc-screening-api",
            "assess",
            "--file",
            "intake.txt",
            "-f",
            "ob.md",
            "--external",
            "--hint",
            "prior records from 2019",
            "--json",
        ])
        .expect("arguments parse");

        let Some(Command::Assess(args)) = cli.command else {
            panic!("expected assess command");
        };
        assert_eq!(args.input.files.len(), 2);
        assert!(args.input.external);
        assert_eq!(args.input.hints, vec!["prior records from 2019"]);
        assert!(args.json);
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["gc-screening-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
