use clap::Parser;
use companion_lib::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    if let Err(e) = cli::run(args).await {
        companion_lib::logging::log_error(None, &e.to_string());
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
