use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use tracing::info;

use super::connection::CsvConnection;
use crate::domain::models::user::UserProfile;
use crate::storage::traits::ProfileStore;

/// Stores each user's profile as `profile.yaml` in their directory
#[derive(Clone)]
pub struct CsvProfileRepository {
    connection: CsvConnection,
}

impl CsvProfileRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ProfileStore for CsvProfileRepository {
    async fn store_profile(&self, profile: &UserProfile) -> Result<()> {
        self.connection.ensure_user_directory_exists(&profile.id)?;
        let file_path = self.connection.get_profile_file_path(&profile.id)?;
        let temp_path = file_path.with_extension("yaml.tmp");

        let yaml = serde_yaml::to_string(profile).context("Failed to serialize profile")?;
        fs::write(&temp_path, yaml)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &file_path)
            .with_context(|| format!("Failed to replace {}", file_path.display()))?;

        info!("Stored profile for user {}", profile.id);
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let file_path = self.connection.get_profile_file_path(user_id)?;
        if !file_path.exists() {
            return Ok(None);
        }

        let yaml = fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let profile = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Corrupt profile in {}", file_path.display()))?;
        Ok(Some(profile))
    }
}
