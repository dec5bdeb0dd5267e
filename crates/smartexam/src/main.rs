use crate::prelude::*;
use clap::Parser;

mod error;
mod export;
mod grade;
mod parse;
mod prelude;
mod render;
mod saved;
mod settings;
mod source;
mod take;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Parse, shuffle, take and grade multiple-choice exams from plain text"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Directory that holds saved exams and recorded attempts
    #[clap(long, env = "SMARTEXAM_HOME", global = true)]
    home: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "SMARTEXAM_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Parse an exam file and print its questions
    Parse(crate::parse::ParseOptions),

    /// Print an exam in canonical text form, optionally shuffled
    Export(crate::export::ExportOptions),

    /// Grade a submission file against an exam
    Grade(crate::grade::GradeOptions),

    /// Print the retest subset of a graded submission
    Retest(crate::grade::RetestOptions),

    /// Take an exam interactively in the terminal
    Take(crate::take::TakeOptions),

    /// Manage the saved-exam library
    Saved(crate::saved::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Parse(options) => crate::parse::run(options, app.global).await,
        SubCommands::Export(options) => crate::export::run(options, app.global).await,
        SubCommands::Grade(options) => crate::grade::run(options, app.global).await,
        SubCommands::Retest(options) => crate::grade::run_retest(options, app.global).await,
        SubCommands::Take(options) => crate::take::run(options, app.global).await,
        SubCommands::Saved(sub_app) => crate::saved::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
