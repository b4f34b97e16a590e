use log::info;
use reqwest::header::{CACHE_CONTROL, PRAGMA};

use super::{
    board_client::BoardClient, error::BoardError, helpers::activities_url,
    models::activity_model::Directory,
};

/// A trait, necessary for every entity that will be used for reading the activity directory.
#[allow(async_fn_in_trait)]
pub trait DirectoryGetter {
    /// The whole directory, exactly as the server reports it.
    async fn get_directory(&self) -> Result<Directory, BoardError>;

    /// Activity names in server order. An independent read, never derived from an earlier fetch.
    async fn get_activity_names(&self) -> Result<Vec<String>, BoardError>;
}

impl BoardClient {
    async fn fetch_directory(&self) -> Result<Directory, BoardError> {
        let request_url = activities_url(&self.base_url)?;
        info!("Getting activities from {}", request_url);
        let response = self
            .http_client
            .get(request_url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?
            .error_for_status()?;
        let directory: Directory = response.json().await?;
        Ok(directory)
    }
}

/// Allows BoardClient to read the directory via requests to the activities API.
impl DirectoryGetter for BoardClient {
    async fn get_directory(&self) -> Result<Directory, BoardError> {
        let directory = self.fetch_directory().await?;
        info!("Collected {} activities", directory.len());
        Ok(directory)
    }

    async fn get_activity_names(&self) -> Result<Vec<String>, BoardError> {
        let names = self.fetch_directory().await?.names();
        info!("Collected {} activity names", names.len());
        Ok(names)
    }
}
