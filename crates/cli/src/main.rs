use std::process::ExitCode;

fn main() -> ExitCode {
    ivrbook_cli::run()
}
