use mediatidy::cli;
use mediatidy::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    mediatidy::init_tracing();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
