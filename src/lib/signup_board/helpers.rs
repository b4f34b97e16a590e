use std::collections::BTreeMap;

use log::{debug, error, warn};
use reqwest::Url;
use serde_json::Value;
use similar::TextDiff;

use super::{
    error::BoardError,
    models::{
        activity_model::Directory,
        feedback_model::{ApiMessage, MutationKind, MutationOutcome, GENERIC_FAILURE_TEXT},
    },
};

pub fn log_directory(directory: &Directory) -> () {
    for (name, activity) in directory.iter() {
        debug!(
            "Activity {} ({}) has {} of {} places taken: {:?}",
            name,
            activity.schedule,
            activity.participants.len(),
            activity.max_participants,
            activity.participants
        );
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, BoardError> {
    let url = Url::parse(raw).map_err(|e| BoardError::invalid_url(raw, e))?;
    if url.cannot_be_a_base() {
        return Err(BoardError::invalid_url(raw, "not a hierarchical url"));
    }
    Ok(url)
}

/* append path segments to the base url, percent-encoding each of them */
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, BoardError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| BoardError::invalid_url(base, "not a hierarchical url"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn activities_url(base: &Url) -> Result<Url, BoardError> {
    endpoint(base, &["activities"])
}

/// `{base}/activities/{activity}/{signup|unregister}?email={email}`, both values percent-encoded.
pub fn mutation_url(
    base: &Url,
    kind: MutationKind,
    activity: &str,
    email: &str,
) -> Result<Url, BoardError> {
    let operation = match kind {
        MutationKind::Signup => "signup",
        MutationKind::Unregister => "unregister",
    };
    let mut url = endpoint(base, &["activities", activity, operation])?;
    url.query_pairs_mut().append_pair("email", email);
    Ok(url)
}

/* the server is free to send any JSON in message/detail; strings are taken as is */
fn value_as_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[derive(serde::Deserialize)]
struct RawApiMessage {
    #[serde(default)]
    message: Value,
    #[serde(default)]
    detail: Value,
}

pub fn parse_api_message(body: &[u8]) -> Result<ApiMessage, serde_json::Error> {
    let raw: RawApiMessage = serde_json::from_slice(body)?;
    Ok(ApiMessage {
        message: value_as_text(raw.message),
        detail: value_as_text(raw.detail),
    })
}

/// Folds a mutation response into a single outcome.
/// A body that is not a JSON object counts as a transport failure.
pub fn outcome_from_response(kind: MutationKind, success: bool, body: &[u8]) -> MutationOutcome {
    match parse_api_message(body) {
        Ok(api_message) if success => match api_message.message {
            Some(message) => MutationOutcome::success(message),
            None => {
                warn!("Server confirmed {} without a message", kind);
                MutationOutcome::success(kind.success_fallback_text())
            }
        },
        Ok(api_message) => MutationOutcome::failure(
            api_message
                .detail
                .unwrap_or_else(|| GENERIC_FAILURE_TEXT.to_owned()),
        ),
        Err(e) => {
            error!("Unreadable {} response: {}", kind, e);
            MutationOutcome::failure(kind.transport_failure_text())
        }
    }
}

/* escape text before it goes into markup */
pub fn escape_html(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            c => c.to_string(),
        })
        .collect()
}

fn roster_as_lines(directory: &Directory, name: &str) -> String {
    directory
        .get(name)
        .map(|activity| {
            activity
                .participants
                .iter()
                .map(|email| format!("{}\n", email))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Unified diffs of every roster that differs between two directories, keyed by activity name.
/// Activities that appeared or vanished are diffed against an empty roster,
/// so an empty activity appearing is not a change.
pub fn roster_changes(old: &Directory, new: &Directory) -> BTreeMap<String, String> {
    let mut changed: BTreeMap<String, String> = BTreeMap::new();

    let names = new
        .iter()
        .map(|(name, _)| name)
        .chain(old.iter().map(|(name, _)| name));
    for name in names {
        if changed.contains_key(name) {
            continue;
        }
        let old_lines = roster_as_lines(old, name);
        let new_lines = roster_as_lines(new, name);
        if old_lines == new_lines {
            continue;
        }
        let diff = TextDiff::from_lines(&old_lines, &new_lines);
        let pretty_diff = diff.unified_diff().header("before", "after").to_string();
        debug!("Roster changes for {}: {}", name, pretty_diff);
        changed.insert(name.to_owned(), pretty_diff);
    }

    changed
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
