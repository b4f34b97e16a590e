use std::{
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use log::{debug, error, info, warn};

use super::{
    confirmer::Confirmer,
    directory_getter::DirectoryGetter,
    error::BoardError,
    feedback::FeedbackBanner,
    helpers::{escape_html, log_directory, roster_changes},
    models::{activity_model::Directory, feedback_model::MutationOutcome},
    renderer::{
        render_directory, ListContainer, RemovalAffordance, SelectionControl, LOAD_FAILURE_TEXT,
    },
    roster_mutator::RosterMutator,
};

/// The signup form (`#signup-form`): an email input and the activity selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub activity: String,
}

impl SignupForm {
    pub fn reset(&mut self) {
        *self = SignupForm::default();
    }

    pub fn to_html(&self, selection: &SelectionControl) -> String {
        format!(
            "<form id=\"signup-form\"><label for=\"email\">Student Email:</label><input type=\"email\" id=\"email\" value=\"{}\" required><label for=\"activity\">Select Activity:</label>{}<button type=\"submit\">Sign Up</button></form>",
            escape_html(&self.email),
            selection.to_html(&self.activity)
        )
    }
}

/// Everything on the page apart from the feedback banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    pub list: ListContainer,
    pub selection: SelectionControl,
    pub form: SignupForm,
}

/// How a user action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The user declined the confirmation; nothing was sent.
    Declined,
    Succeeded(String),
    Failed(String),
}

#[derive(Debug, Default)]
struct ViewState {
    view: BoardView,
    /* last directory that made it to the screen */
    directory: Option<Directory>,
}

struct PendingAction<'a>(&'a AtomicUsize);

impl<'a> PendingAction<'a> {
    fn begin(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        PendingAction(counter)
    }
}

impl Drop for PendingAction<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the page state and sequences every user action as
/// mutate, then feedback, then (on success only) refetch and re-render.
///
/// Actions are not serialized: several may be in flight at once. Directory
/// refreshes carry a generation stamp and only the latest one issued is applied.
/// Feedback hide timers run on the ambient tokio runtime; without one, feedback stays up.
pub struct Controller<DG, RM, CF> {
    directory_getter: DG,
    roster_mutator: RM,
    confirmer: CF,
    state: Mutex<ViewState>,
    banner: FeedbackBanner,
    refresh_generation: AtomicU64,
    in_flight: AtomicUsize,
}

impl<DG: DirectoryGetter, RM: RosterMutator, CF: Confirmer> Controller<DG, RM, CF> {
    pub fn new(
        directory_getter: DG,
        roster_mutator: RM,
        confirmer: CF,
        hide_after: Duration,
    ) -> Self {
        Controller {
            directory_getter,
            roster_mutator,
            confirmer,
            state: Mutex::new(ViewState::default()),
            banner: FeedbackBanner::new(hide_after),
            refresh_generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Page load: draw the directory and fill the selection control.
    pub async fn load(&self) -> Result<(), BoardError> {
        info!("Loading activity board");
        self.refresh().await
    }

    /// Fetches the directory and, if no newer refresh was issued meanwhile,
    /// replaces the cards and the selection options with it.
    /// On failure the list shows the load error; the selection control, if still
    /// empty, is filled from the separate names read.
    pub async fn refresh(&self) -> Result<(), BoardError> {
        let stamp = self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.directory_getter.get_directory().await;

        let latest = self.refresh_generation.load(Ordering::SeqCst);
        if stamp != latest {
            warn!("Discarding directory refresh {} superseded by {}", stamp, latest);
            return Ok(());
        }

        match fetched {
            Ok(directory) => {
                self.apply_directory(directory);
                Ok(())
            }
            Err(e) => {
                error!("Error loading activities: {}", e);
                let needs_options = {
                    let mut state = lock(&self.state);
                    state.view.list.show_error(LOAD_FAILURE_TEXT);
                    state.view.selection.is_empty()
                };
                if needs_options {
                    self.load_activity_options().await;
                }
                Err(e)
            }
        }
    }

    fn apply_directory(&self, directory: Directory) {
        log_directory(&directory);
        let mut state = lock(&self.state);
        if let Some(previous) = &state.directory {
            let changed = roster_changes(previous, &directory);
            if !changed.is_empty() {
                info!("Found {} changed rosters since last refresh", changed.len());
            }
        }
        render_directory(&mut state.view.list, &directory);
        state.view.selection.populate(directory.names());
        state.directory = Some(directory);
    }

    async fn load_activity_options(&self) {
        match self.directory_getter.get_activity_names().await {
            Ok(names) => {
                let mut state = lock(&self.state);
                if state.view.selection.is_empty() {
                    info!("Filled activity selection with {} names", names.len());
                    state.view.selection.populate(names);
                }
            }
            Err(e) => error!("Error loading activity options: {}", e),
        }
    }

    pub fn fill_form(&self, email: impl Into<String>, activity: impl Into<String>) {
        let mut state = lock(&self.state);
        state.view.form.email = email.into();
        state.view.form.activity = activity.into();
    }

    /// Signs up whatever the form currently holds.
    /// On success the form is cleared and the directory refetched.
    pub async fn submit_signup(&self) -> ActionOutcome {
        let form = lock(&self.state).view.form.clone();
        let _pending = PendingAction::begin(&self.in_flight);

        let outcome = self.roster_mutator.signup(&form.activity, &form.email).await;
        if outcome.ok {
            lock(&self.state).view.form.reset();
        }
        self.finish_mutation(outcome).await
    }

    /// Asks for confirmation, then unregisters the participant the affordance points at.
    pub async fn request_unregister(&self, affordance: &RemovalAffordance) -> ActionOutcome {
        if !self.confirmer.confirm(&affordance.confirmation_prompt()) {
            info!(
                "Unregistering {} from {} declined",
                affordance.email, affordance.activity
            );
            return ActionOutcome::Declined;
        }
        let _pending = PendingAction::begin(&self.in_flight);

        let outcome = self
            .roster_mutator
            .unregister(&affordance.activity, &affordance.email)
            .await;
        self.finish_mutation(outcome).await
    }

    /* the returned outcome is the mutation's; a failed refetch only changes the list */
    async fn finish_mutation(&self, outcome: MutationOutcome) -> ActionOutcome {
        self.banner.show_feedback(outcome.feedback());
        if !outcome.ok {
            return ActionOutcome::Failed(outcome.message);
        }
        if let Err(e) = self.refresh().await {
            debug!("Refresh after mutation failed: {}", e);
        }
        ActionOutcome::Succeeded(outcome.message)
    }

    pub fn view(&self) -> BoardView {
        lock(&self.state).view.clone()
    }

    pub fn form(&self) -> SignupForm {
        lock(&self.state).view.form.clone()
    }

    pub fn directory(&self) -> Option<Directory> {
        lock(&self.state).directory.clone()
    }

    pub fn banner(&self) -> &FeedbackBanner {
        &self.banner
    }

    /// Number of mutations currently waiting for the server.
    pub fn pending_actions(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn render_page_html(&self) -> String {
        let state = lock(&self.state);
        format!(
            "<section id=\"activities-container\"><h3>Available Activities</h3>{}</section><section id=\"signup-container\"><h3>Sign Up for an Activity</h3>{}{}</section>",
            state.view.list.to_html(),
            state.view.form.to_html(&state.view.selection),
            self.banner.to_html()
        )
    }
}
