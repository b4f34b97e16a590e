use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use serde::Deserialize;

pub mod activity_model;
pub mod feedback_model;

/// A model for describing ARGS of the tool.
/// Consists of:
/// 1. Path to config.json, that contains the API address and timing parameters.
/// 2. The action to perform against the board.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    pub config_json_path: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show every activity with its roster
    List {
        /// Also write the rendered page fragment to this file
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,
    },
    /// Show the activity names offered for sign-up
    Names,
    /// Register an email for an activity
    Signup {
        #[arg(long)]
        activity: String,
        #[arg(long)]
        email: String,
    },
    /// Remove an email from an activity
    Unregister {
        #[arg(long)]
        activity: String,
        #[arg(long)]
        email: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// A model for describing configuration of the tool.
/// Consists of:
/// 1. Base address of the activities API
/// 2. How long a feedback message stays visible, in milliseconds
/// 3. Per-request timeout, in seconds
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_feedback_timeout_ms")]
    pub feedback_timeout_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn feedback_timeout(&self) -> Duration {
        Duration::from_millis(self.feedback_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: default_api_base_url(),
            feedback_timeout_ms: default_feedback_timeout_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_owned()
}

fn default_feedback_timeout_ms() -> u64 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    10
}
