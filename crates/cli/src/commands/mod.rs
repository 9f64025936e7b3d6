//! Command implementations
//!
//! Each subcommand lives in its own module and returns an [`ExitCode`].

mod album;
mod completions;
mod inspect;
mod params;
mod photo;
mod video;

use std::path::Path;
use std::sync::Arc;

use clap::Subcommand;
use mu_core::{ConfigManager, MediaSource, Uploader};
use mu_http::{EnvSession, HttpTransport};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Uploader wired to the HTTP transport and the environment session
pub type HttpUploader = Uploader<HttpTransport, Arc<EnvSession>>;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the duration of an MP4 video (no network)
    Inspect(inspect::InspectArgs),

    /// Preview the parameter set sent for an upload (no network)
    Params(params::ParamsArgs),

    /// Upload a photo
    Photo(photo::PhotoArgs),

    /// Upload a video and its cover frame
    Video(video::VideoArgs),

    /// Upload an album described by a JSON manifest
    Album(album::AlbumArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Dispatch a parsed command
pub async fn execute(cmd: Commands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match cmd {
        Commands::Inspect(args) => inspect::execute(args, &formatter).await,
        Commands::Params(args) => params::execute(args, &formatter),
        Commands::Photo(args) => photo::execute(args, &formatter).await,
        Commands::Video(args) => video::execute(args, &formatter).await,
        Commands::Album(args) => album::execute(args, &formatter).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Build an uploader from the config file and `MU_SESSION_ID`
pub fn get_uploader(formatter: &Formatter) -> Result<HttpUploader, ExitCode> {
    let config = match ConfigManager::new().and_then(|manager| {
        tracing::debug!(path = %manager.config_path().display(), "Loading config");
        manager.load()
    }) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load config: {e}"));
            return Err(ExitCode::from_error(&e));
        }
    };

    let session = Arc::new(EnvSession::new(config.session_id.clone()));
    match HttpTransport::new(&config, session.clone()) {
        Ok(transport) => {
            tracing::debug!(
                api_base = %config.api_base,
                rupload_host = %config.rupload_host,
                max_attempts = config.retry.max_attempts,
                "Uploader ready"
            );
            Ok(Uploader::new(transport, session, config))
        }
        Err(e) => {
            formatter.error(&format!("Failed to create HTTP transport: {e}"));
            Err(ExitCode::from_error(&e))
        }
    }
}

/// Read a media file, reporting failures through the formatter
pub async fn read_source(path: &Path, formatter: &Formatter) -> Result<MediaSource, ExitCode> {
    MediaSource::from_path(path).await.map_err(|e| {
        formatter.error(&format!("Failed to read '{}': {e}", path.display()));
        ExitCode::GeneralError
    })
}

/// Report an upload error and pick its exit code
pub fn report_error(formatter: &Formatter, context: &str, error: &mu_core::Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(error)
}
