use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use confguard::{
    ConfguardError, ConsolePrompter, Guard, GuardArgs, Prompter, RefusingPrompter, RunReport,
    load_settings,
};

fn main() -> ExitCode {
    let args = GuardArgs::parse();
    init_tracing();

    match run(args) {
        Ok(report) => {
            eprint!("{}", report.to_string().green());
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_error(err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: GuardArgs) -> Result<RunReport, ConfguardError> {
    let settings_file = args.settings.clone();
    let settings = load_settings(settings_file.as_deref(), args.into_overrides())?;

    let mut prompter: Box<dyn Prompter> = if settings.non_interactive {
        Box::new(RefusingPrompter)
    } else {
        Box::new(ConsolePrompter::new())
    };

    Guard::from_settings(&settings).run(prompter.as_mut())
}

/// Log filter comes from `CONFGUARD_LOG`; output goes to stderr so it never
/// mixes with prompts on a redirected stdout.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("CONFGUARD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("confguard=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(feature = "rich-errors")]
fn report_error(err: ConfguardError) {
    eprintln!("{:?}", miette::Report::new(err));
}

#[cfg(not(feature = "rich-errors"))]
fn report_error(err: ConfguardError) {
    eprintln!("{} {}", "error:".red().bold(), err.to_string().red());
    if matches!(err, ConfguardError::WriteFailed { .. }) {
        eprintln!("Suggestion: check the file and folder permissions for the user.");
    }
    if err.is_document_level() {
        eprintln!("Giving up.");
    }
}
