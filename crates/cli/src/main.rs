use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    freshcart_cli::run()
}
