use std::io::{self, BufRead, Write};

use log::error;
use tokio::runtime::{Handle, RuntimeFlavor};

/// A trait, necessary for every entity that asks the user to confirm a removal.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Asks on stdout and reads the answer from stdin. Anything but `y`/`yes` declines.
///
/// Waiting for the answer blocks the calling thread. On a multi-threaded tokio
/// runtime the wait is moved off the worker with `block_in_place`; a
/// current-thread runtime stalls until the user answers.
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        let ask_stdin = || ask(prompt, &mut io::stdin().lock(), &mut io::stdout());
        match Handle::try_current() {
            Ok(runtime) if runtime.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(ask_stdin)
            }
            _ => ask_stdin(),
        }
    }
}

fn ask(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> bool {
    if let Err(e) = write!(output, "{} [y/N] ", prompt).and_then(|_| output.flush()) {
        error!("Error writing confirmation prompt: {}", e);
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            error!("Error reading confirmation: {}", e);
            false
        }
    }
}

/// Confirms everything, for non-interactive use.
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
