use log::info;
use reqwest::{Client, Url};

use super::{error::BoardError, helpers::parse_base_url, models::Config};

/// HTTP access to the activities API. Implements both [`DirectoryGetter`] and [`RosterMutator`].
///
/// [`DirectoryGetter`]: super::directory_getter::DirectoryGetter
/// [`RosterMutator`]: super::roster_mutator::RosterMutator
#[derive(Debug, Clone)]
pub struct BoardClient {
    pub(crate) http_client: Client,
    pub(crate) base_url: Url,
}

impl BoardClient {
    pub fn new(config: &Config) -> Result<Self, BoardError> {
        let base_url = parse_base_url(&config.api_base_url)?;
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        info!("Talking to the activities API at {}", base_url);
        Ok(BoardClient {
            http_client,
            base_url,
        })
    }
}
