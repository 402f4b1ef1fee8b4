//! gemini-md-export CLI entry point.

use clap::Parser;

use gemini_md_export::cli::{commands, exit_code, handle_error, Cli, Commands};
use gemini_md_export::infrastructure::config::ConfigLoader;
use gemini_md_export::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    let loaded = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = loaded.unwrap_or_else(|err| handle_error(err, json));
    let logger =
        LoggerImpl::init(&LogConfig::from(&config.logging)).unwrap_or_else(|err| handle_error(err, json));

    let result = match cli.command {
        Commands::Export(args) => commands::export::execute(args, &config, json)
            .await
            .map(|result| exit_code(&result)),
        Commands::Copy(args) => commands::copy::execute(args, &config, json)
            .await
            .map(|result| exit_code(&result)),
        Commands::Serve(args) => commands::serve::execute(args, &config).await.map(|()| 0),
    };

    // flush the file writer before exiting
    drop(logger);
    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => handle_error(err, json),
    }
}
