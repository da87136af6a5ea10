use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::dictionary::Dictionary;
use server::network::Server;
use std::path::PathBuf;

/// Main-method of the application.
/// Loads the dictionary, binds the listening socket and runs the game until Ctrl+C.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Word list, one word per line
        dictionary: PathBuf,
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let dictionary = Dictionary::load(&args.dictionary)?;
    let server = Server::bind(ServerConfig::default(), dictionary).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
