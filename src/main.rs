use std::process::ExitCode;

use clap::Parser;

use dock_emulator::{Args, EXIT_SUCCESS, exit_code_for, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let mut stdout = std::io::stdout();

    match run(args, &mut stdout).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}
