use lib::signup_board::models;
use lib::signup_board::error::BoardError;
use lib::signup_board::{board_client, confirmer, controller, directory_getter, renderer};

use std::process::ExitCode;

use board_client::BoardClient;
use clap::Parser;
use confirmer::{AssumeYes, Confirmer, StdinConfirmer};
use controller::{ActionOutcome, Controller};
use directory_getter::DirectoryGetter;
use figment::{
    providers::{Env, Format, Json},
    Figment,
};
use log::{error, info, warn};
use models::{Args, Command, Config};
use renderer::RemovalAffordance;

fn report(outcome: &ActionOutcome) -> ExitCode {
    match outcome {
        ActionOutcome::Succeeded(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        ActionOutcome::Failed(message) => {
            println!("{}", message);
            ExitCode::FAILURE
        }
        ActionOutcome::Declined => {
            println!("Nothing changed");
            ExitCode::SUCCESS
        }
    }
}

async fn unregister<CF: Confirmer>(
    client: BoardClient,
    confirmer: CF,
    config: &Config,
    activity: String,
    email: String,
) -> ExitCode {
    let controller =
        Controller::new(client.clone(), client, confirmer, config.feedback_timeout());
    if let Err(e) = controller.load().await {
        warn!("Board did not load, unregistering anyway: {}", e);
    }
    let affordance = match controller.view().list.find_affordance(&activity, &email) {
        Some(affordance) => affordance.clone(),
        None => {
            warn!("{} is not listed under {}", email, activity);
            RemovalAffordance::new(activity, email)
        }
    };
    let outcome = controller.request_unregister(&affordance).await;
    report(&outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    /* Setup logging */
    env_logger::builder()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    /* Get all the required resources */
    let args = Args::parse();
    let config: Config = match Figment::new()
        .merge(Json::file(&args.config_json_path))
        .merge(Env::prefixed("BOARD_"))
        .extract()
    {
        Ok(config) => config,
        Err(e) => {
            error!("{}", BoardError::from(e));
            return ExitCode::FAILURE;
        }
    };
    info!("Read config from {}", args.config_json_path.display());
    let client = match BoardClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Command::List { html } => {
            let controller =
                Controller::new(client.clone(), client, AssumeYes, config.feedback_timeout());
            let loaded = controller.load().await;
            print!("{}", controller.view().list);
            if let Some(path) = html {
                if let Err(e) = std::fs::write(&path, controller.render_page_html()) {
                    error!("Error writing {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
                info!("Wrote page to {}", path.display());
            }
            match loaded {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            }
        }
        Command::Names => match client.get_activity_names().await {
            Ok(names) => {
                names.iter().for_each(|name| println!("{}", name));
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Error loading activity names: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::Signup { activity, email } => {
            let controller =
                Controller::new(client.clone(), client, AssumeYes, config.feedback_timeout());
            if let Err(e) = controller.load().await {
                warn!("Board did not load, signing up anyway: {}", e);
            }
            if !controller.view().selection.contains(&activity) {
                warn!("{} is not among the offered activities", activity);
            }
            controller.fill_form(email, activity);
            let outcome = controller.submit_signup().await;
            report(&outcome)
        }
        Command::Unregister {
            activity,
            email,
            yes,
        } => {
            if yes {
                unregister(client, AssumeYes, &config, activity, email).await
            } else {
                unregister(client, StdinConfirmer, &config, activity, email).await
            }
        }
    }
}
