use std::process::ExitCode;

fn main() -> ExitCode {
    plumbline_cli::run()
}
