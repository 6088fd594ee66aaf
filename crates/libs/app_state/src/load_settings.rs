use crate::{AppSettings, RawSettings};
use color_eyre::eyre::Result;
use std::path::Path;
use tracing::debug;

/// Default location of the settings file, relative to the working directory.
pub const SETTINGS_PATH: &str = "config/settings.yaml";

/// Load the app settings from YAML + environment variables.
pub fn load_app_settings() -> Result<AppSettings> {
    // Need to load from dotenv to get it to overwrite the db url from env.
    dotenv::from_path(".env").ok();
    load_app_settings_from(
        Path::new(SETTINGS_PATH),
        config::Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("contest.entry_statuses")
            .with_list_parse_key("contest.ranking_statuses"),
    )
}

/// Load settings from a specific YAML file, overlaid by the given environment source.
pub fn load_app_settings_from(
    config_path: &Path,
    environment: config::Environment,
) -> Result<AppSettings> {
    let config_path = config_path.canonicalize()?;
    debug!("Loading settings from {}", config_path.display());

    let builder = config::Config::builder()
        .add_source(config::File::from(config_path))
        .add_source(environment);

    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    Ok(raw_settings.into())
}
