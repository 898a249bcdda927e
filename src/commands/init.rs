//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::IndexStore;
use std::path::PathBuf;
use tracing::info;

/// Write the default config and create the index database
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let config = Config::with_base_dir(base_dir);

    if config.paths.config_file.exists() && !force {
        return Err(Error::Config(format!(
            "Already initialized at {} (use --force to overwrite)",
            config.paths.config_file.display()
        )));
    }

    std::fs::create_dir_all(&config.paths.base_dir)?;
    std::fs::create_dir_all(&config.paths.sessions_dir)?;
    config.save()?;

    let store = IndexStore::connect(
        &config.paths.db_file,
        config.embedding.dimension,
        config.metric()?,
    )
    .await?;
    store.init_schema().await?;

    info!("Initialized registrar at {:?}", config.paths.base_dir);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_config_and_database() {
        let dir = TempDir::new().unwrap();
        let config = cmd_init(Some(dir.path().to_path_buf()), false).await.unwrap();

        assert!(config.paths.config_file.exists());
        assert!(config.paths.db_file.exists());
        assert!(config.paths.sessions_dir.exists());

        let store = IndexStore::connect(
            &config.paths.db_file,
            config.embedding.dimension,
            config.metric().unwrap(),
        )
        .await
        .unwrap();
        assert!(store.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        cmd_init(Some(dir.path().to_path_buf()), false).await.unwrap();

        let err = cmd_init(Some(dir.path().to_path_buf()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        assert!(cmd_init(Some(dir.path().to_path_buf()), true).await.is_ok());
    }
}
