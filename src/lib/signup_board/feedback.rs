use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::{debug, warn};
use tokio::{runtime::Handle, task::JoinHandle};

use super::{
    helpers::escape_html,
    models::feedback_model::{Feedback, FeedbackKind},
};

#[derive(Debug, Default)]
struct BannerState {
    feedback: Option<Feedback>,
    visible: bool,
    /* bumped on every show, a hide timer only acts on the message it was armed for */
    generation: u64,
}

/// What the banner currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerSnapshot {
    pub feedback: Option<Feedback>,
    pub visible: bool,
}

/// The single feedback slot (`#message`). Most recent message wins; each message
/// hides itself after `hide_after` unless a newer one replaced it first.
#[derive(Debug)]
pub struct FeedbackBanner {
    state: Arc<Mutex<BannerState>>,
    pending_hide: Mutex<Option<JoinHandle<()>>>,
    hide_after: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FeedbackBanner {
    pub fn new(hide_after: Duration) -> Self {
        FeedbackBanner {
            state: Arc::new(Mutex::new(BannerState::default())),
            pending_hide: Mutex::new(None),
            hide_after,
        }
    }

    /// Shows the message and arms a hide timer, cancelling the timer of any previous message.
    /// Outside a tokio runtime no timer can be armed and the message stays until replaced or hidden.
    pub fn show(&self, kind: FeedbackKind, text: impl Into<String>) {
        let feedback = Feedback {
            kind,
            text: text.into(),
        };
        debug!("Showing feedback {}", feedback);
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.feedback = Some(feedback);
            state.visible = true;
            state.generation
        };

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Feedback will not hide by itself: {}", e);
                if let Some(previous) = lock(&self.pending_hide).take() {
                    previous.abort();
                }
                return;
            }
        };
        let state = Arc::clone(&self.state);
        let hide_after = self.hide_after;
        let hide = runtime.spawn(async move {
            tokio::time::sleep(hide_after).await;
            let mut state = lock(&state);
            if state.generation == generation {
                state.visible = false;
                debug!("Feedback hidden after {:?}", hide_after);
            }
        });

        if let Some(previous) = lock(&self.pending_hide).replace(hide) {
            previous.abort();
        }
    }

    pub fn show_feedback(&self, feedback: Feedback) {
        self.show(feedback.kind, feedback.text);
    }

    pub fn hide(&self) {
        lock(&self.state).visible = false;
    }

    pub fn snapshot(&self) -> BannerSnapshot {
        let state = lock(&self.state);
        BannerSnapshot {
            feedback: state.feedback.clone(),
            visible: state.visible,
        }
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    pub fn to_html(&self) -> String {
        let state = lock(&self.state);
        match &state.feedback {
            Some(feedback) => format!(
                "<div id=\"message\" class=\"{}{}\">{}</div>",
                feedback.kind.css_class(),
                if state.visible { "" } else { " hidden" },
                escape_html(&feedback.text)
            ),
            None => "<div id=\"message\" class=\"hidden\"></div>".to_owned(),
        }
    }
}

impl Drop for FeedbackBanner {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.pending_hide).take() {
            pending.abort();
        }
    }
}
