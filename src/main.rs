use std::process::ExitCode;

use clap::Parser;

/// Install the binary for this platform from a GitHub repository's latest
/// release.
///
/// The matching asset is unpacked into the working directory as an executable
/// named after the repository. Set RUST_LOG=debug to list every asset.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Repository owner
    owner: String,

    /// Repository name; also the name of the installed binary
    repo: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = pp::Config::from_env()
        .map_err(pp::InstallerError::from)
        .and_then(|config| pp::install(&config, &cli.owner, &cli.repo));

    match result {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
