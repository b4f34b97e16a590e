use log::{error, info};
use reqwest::Method;

use super::{
    board_client::BoardClient,
    helpers::{mutation_url, outcome_from_response},
    models::feedback_model::{MutationKind, MutationOutcome},
};

/// A trait, necessary for every entity that will change rosters.
/// Failures of any sort come back as an outcome with `ok == false`, never as an error.
#[allow(async_fn_in_trait)]
pub trait RosterMutator {
    async fn signup(&self, activity: &str, email: &str) -> MutationOutcome;

    /// Not idempotent: removing an absent participant is reported by the server as a failure.
    async fn unregister(&self, activity: &str, email: &str) -> MutationOutcome;
}

impl BoardClient {
    async fn mutate(&self, kind: MutationKind, activity: &str, email: &str) -> MutationOutcome {
        let request_url = match mutation_url(&self.base_url, kind, activity, email) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot build {} request: {}", kind, e);
                return MutationOutcome::failure(kind.transport_failure_text());
            }
        };
        let method = match kind {
            MutationKind::Signup => Method::POST,
            MutationKind::Unregister => Method::DELETE,
        };
        info!("Sending {} for {} to {}", kind, email, activity);

        let response = match self.http_client.request(method, request_url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Error sending {}: {}", kind, e);
                return MutationOutcome::failure(kind.transport_failure_text());
            }
        };
        let status = response.status();
        match response.bytes().await {
            Ok(body) => {
                let outcome = outcome_from_response(kind, status.is_success(), &body);
                info!("Server answered {} with {}: {}", kind, status, outcome.message);
                outcome
            }
            Err(e) => {
                error!("Error reading {} response: {}", kind, e);
                MutationOutcome::failure(kind.transport_failure_text())
            }
        }
    }
}

/// Allows BoardClient to change rosters via requests to the activities API.
impl RosterMutator for BoardClient {
    async fn signup(&self, activity: &str, email: &str) -> MutationOutcome {
        self.mutate(MutationKind::Signup, activity, email).await
    }

    async fn unregister(&self, activity: &str, email: &str) -> MutationOutcome {
        self.mutate(MutationKind::Unregister, activity, email).await
    }
}
