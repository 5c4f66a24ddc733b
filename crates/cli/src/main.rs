use std::process::ExitCode;

fn main() -> ExitCode {
    tubeprice_cli::run()
}
