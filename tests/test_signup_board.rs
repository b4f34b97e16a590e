use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lib::signup_board::confirmer::Confirmer;
use lib::signup_board::controller::{ActionOutcome, Controller};
use lib::signup_board::directory_getter::DirectoryGetter;
use lib::signup_board::error::BoardError;
use lib::signup_board::feedback::BannerSnapshot;
use lib::signup_board::helpers::outcome_from_response;
use lib::signup_board::models::activity_model::{Activity, Directory};
use lib::signup_board::models::feedback_model::{
    Feedback, FeedbackKind, MutationKind, MutationOutcome,
};
use lib::signup_board::renderer::{ListContent, RemovalAffordance, LOAD_FAILURE_TEXT};
use lib::signup_board::roster_mutator::RosterMutator;
use tokio::sync::Notify;

const HIDE_AFTER: Duration = Duration::from_secs(5);

/// In-memory stand-in for the activities API, answering the way the real server does.
pub struct TestBoard {
    pub directory: Mutex<Directory>,
    // every request the controller made, as "METHOD target"
    pub calls: Mutex<Vec<String>>,
    pub directory_down: AtomicBool,
    pub names_down: AtomicBool,
    pub mutations_down: AtomicBool,
    // if armed, the next directory read snapshots the data and then waits for it
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl TestBoard {
    pub fn new() -> Self {
        let directory: Directory = [
            (
                "Chess Club",
                Activity {
                    description: "Learn strategies and compete in chess tournaments".to_string(),
                    schedule: "Fridays, 3:30 PM - 5:00 PM".to_string(),
                    max_participants: 12,
                    participants: vec![
                        "michael@mergington.edu".to_string(),
                        "daniel@mergington.edu".to_string(),
                    ],
                },
            ),
            (
                "Programming Class",
                Activity {
                    description: "Learn programming fundamentals and build software projects"
                        .to_string(),
                    schedule: "Tuesdays and Thursdays, 3:30 PM - 4:30 PM".to_string(),
                    max_participants: 20,
                    participants: vec![
                        "emma@mergington.edu".to_string(),
                        "sophia@mergington.edu".to_string(),
                    ],
                },
            ),
            (
                "Gym Class",
                Activity {
                    description: "Physical education and sports activities".to_string(),
                    schedule: "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM".to_string(),
                    max_participants: 30,
                    participants: vec![],
                },
            ),
        ]
        .into_iter()
        .collect();

        TestBoard {
            directory: Mutex::new(directory),
            calls: Mutex::new(Vec::new()),
            directory_down: AtomicBool::new(false),
            names_down: AtomicBool::new(false),
            mutations_down: AtomicBool::new(false),
            gate: Mutex::new(None),
        }
    }

    pub fn arm_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn forget_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn answer(&self, kind: MutationKind, ok: bool, body: String) -> MutationOutcome {
        outcome_from_response(kind, ok, body.as_bytes())
    }
}

async fn unreachable() -> BoardError {
    reqwest::Client::new()
        .get("::unreachable::")
        .send()
        .await
        .unwrap_err()
        .into()
}

impl DirectoryGetter for &TestBoard {
    async fn get_directory(&self) -> Result<Directory, BoardError> {
        self.record("GET /activities".to_string());
        if self.directory_down.load(Ordering::SeqCst) {
            return Err(unreachable().await);
        }
        let snapshot = self.directory.lock().unwrap().clone();
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(snapshot)
    }

    async fn get_activity_names(&self) -> Result<Vec<String>, BoardError> {
        self.record("GET /activities (names)".to_string());
        if self.names_down.load(Ordering::SeqCst) {
            return Err(unreachable().await);
        }
        Ok(self.directory.lock().unwrap().names())
    }
}

impl RosterMutator for &TestBoard {
    async fn signup(&self, activity: &str, email: &str) -> MutationOutcome {
        self.record(format!("POST {}/signup {}", activity, email));
        if self.mutations_down.load(Ordering::SeqCst) {
            return self.answer(MutationKind::Signup, false, "upstream connect error".to_string());
        }
        let mut directory = self.directory.lock().unwrap();
        let Some(found) = directory.get_mut(activity) else {
            return self.answer(
                MutationKind::Signup,
                false,
                r#"{"detail": "Activity not found"}"#.to_string(),
            );
        };
        if found.participants.iter().any(|p| p == email) {
            return self.answer(
                MutationKind::Signup,
                false,
                r#"{"detail": "Student is already signed up for this activity"}"#.to_string(),
            );
        }
        found.participants.push(email.to_string());
        self.answer(
            MutationKind::Signup,
            true,
            format!(r#"{{"message": "Signed up {} for {}"}}"#, email, activity),
        )
    }

    async fn unregister(&self, activity: &str, email: &str) -> MutationOutcome {
        self.record(format!("DELETE {}/unregister {}", activity, email));
        if self.mutations_down.load(Ordering::SeqCst) {
            return self.answer(MutationKind::Unregister, false, String::new());
        }
        let mut directory = self.directory.lock().unwrap();
        let Some(found) = directory.get_mut(activity) else {
            return self.answer(
                MutationKind::Unregister,
                false,
                r#"{"detail": "Activity not found"}"#.to_string(),
            );
        };
        let Some(position) = found.participants.iter().position(|p| p == email) else {
            return self.answer(
                MutationKind::Unregister,
                false,
                r#"{"detail": "Student is not signed up for this activity"}"#.to_string(),
            );
        };
        found.participants.remove(position);
        self.answer(
            MutationKind::Unregister,
            true,
            format!(r#"{{"message": "Unregistered {} from {}"}}"#, email, activity),
        )
    }
}

pub struct TestConfirmer {
    pub answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl TestConfirmer {
    pub fn answering(answer: bool) -> Self {
        TestConfirmer {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl Confirmer for &TestConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

fn controller<'a>(
    board: &'a TestBoard,
    confirmer: &'a TestConfirmer,
) -> Controller<&'a TestBoard, &'a TestBoard, &'a TestConfirmer> {
    Controller::new(board, board, confirmer, HIDE_AFTER)
}

fn roster(controller: &Controller<&TestBoard, &TestBoard, &TestConfirmer>, activity: &str) -> Vec<String> {
    controller
        .view()
        .list
        .removal_affordances()
        .filter(|affordance| affordance.activity == activity)
        .map(|affordance| affordance.email.clone())
        .collect()
}

#[tokio::test]
async fn load_renders_cards_and_options_from_one_fetch() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);

    controller.load().await.unwrap();

    let view = controller.view();
    let names = view.list.cards().iter().map(|c| c.name.clone()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Chess Club", "Programming Class", "Gym Class"]);
    assert_eq!(view.selection.options(), names.as_slice());
    assert_eq!(view.list.cards()[0].capacity_line(), "10 / 12");
    assert_eq!(board.calls(), vec!["GET /activities"]);
    assert_eq!(controller.banner().snapshot(), BannerSnapshot::default());
}

#[tokio::test]
async fn successful_signup_clears_form_and_rerenders() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();

    controller.fill_form("newstudent@mergington.edu", "Gym Class");
    let outcome = controller.submit_signup().await;

    assert_eq!(
        outcome,
        ActionOutcome::Succeeded("Signed up newstudent@mergington.edu for Gym Class".to_string())
    );
    assert_eq!(controller.form().email, "");
    assert_eq!(roster(&controller, "Gym Class"), vec!["newstudent@mergington.edu"]);
    assert_eq!(
        controller.banner().snapshot(),
        BannerSnapshot {
            feedback: Some(Feedback {
                kind: FeedbackKind::Success,
                text: "Signed up newstudent@mergington.edu for Gym Class".to_string()
            }),
            visible: true,
        }
    );
    assert_eq!(
        board.calls(),
        vec![
            "GET /activities",
            "POST Gym Class/signup newstudent@mergington.edu",
            "GET /activities",
        ]
    );
}

#[tokio::test]
async fn failed_signup_keeps_form_and_shows_detail() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();
    board.forget_calls();

    controller.fill_form("michael@mergington.edu", "Chess Club");
    let outcome = controller.submit_signup().await;

    assert_eq!(
        outcome,
        ActionOutcome::Failed("Student is already signed up for this activity".to_string())
    );
    assert_eq!(controller.form().email, "michael@mergington.edu");
    assert_eq!(controller.form().activity, "Chess Club");
    let banner = controller.banner().snapshot();
    assert!(banner.visible);
    assert_eq!(
        banner.feedback,
        Some(Feedback {
            kind: FeedbackKind::Error,
            text: "Student is already signed up for this activity".to_string()
        })
    );
    // no refetch after a failure
    assert_eq!(board.calls(), vec!["POST Chess Club/signup michael@mergington.edu"]);
}

#[tokio::test]
async fn signup_for_unknown_activity_reports_server_detail() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();

    controller.fill_form("student@mergington.edu", "Nonexistent Activity");
    let outcome = controller.submit_signup().await;
    assert_eq!(outcome, ActionOutcome::Failed("Activity not found".to_string()));
}

#[tokio::test]
async fn signup_transport_failure_uses_fallback_text() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();
    board.mutations_down.store(true, Ordering::SeqCst);

    controller.fill_form("newstudent@mergington.edu", "Gym Class");
    let outcome = controller.submit_signup().await;

    assert_eq!(
        outcome,
        ActionOutcome::Failed("Failed to sign up. Please try again.".to_string())
    );
    assert_eq!(controller.form().email, "newstudent@mergington.edu");
    assert_eq!(controller.banner().to_html(), "<div id=\"message\" class=\"error\">Failed to sign up. Please try again.</div>");
}

#[tokio::test]
async fn declined_unregister_sends_nothing() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(false);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();
    board.forget_calls();
    let banner_before = controller.banner().snapshot();

    let affordance = controller
        .view()
        .list
        .find_affordance("Chess Club", "daniel@mergington.edu")
        .cloned()
        .unwrap();
    let outcome = controller.request_unregister(&affordance).await;

    assert_eq!(outcome, ActionOutcome::Declined);
    assert!(board.calls().is_empty());
    assert_eq!(controller.banner().snapshot(), banner_before);
    assert_eq!(
        *confirmer.prompts.lock().unwrap(),
        vec!["Are you sure you want to unregister daniel@mergington.edu from Chess Club?"]
    );
    assert_eq!(
        roster(&controller, "Chess Club"),
        vec!["michael@mergington.edu", "daniel@mergington.edu"]
    );
}

#[tokio::test]
async fn confirmed_unregister_removes_participant() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();

    let affordance = RemovalAffordance::new("Chess Club", "michael@mergington.edu");
    let outcome = controller.request_unregister(&affordance).await;

    assert_eq!(
        outcome,
        ActionOutcome::Succeeded("Unregistered michael@mergington.edu from Chess Club".to_string())
    );
    assert_eq!(roster(&controller, "Chess Club"), vec!["daniel@mergington.edu"]);
    assert_eq!(controller.view().list.cards()[0].capacity_line(), "11 / 12");
    assert!(controller.banner().is_visible());
}

#[tokio::test]
async fn unregistering_absent_participant_is_a_failure() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();

    let affordance = RemovalAffordance::new("Gym Class", "ghost@mergington.edu");
    let outcome = controller.request_unregister(&affordance).await;
    assert_eq!(
        outcome,
        ActionOutcome::Failed("Student is not signed up for this activity".to_string())
    );
}

#[tokio::test]
async fn unregister_transport_failure_uses_fallback_text() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();
    board.mutations_down.store(true, Ordering::SeqCst);

    let affordance = RemovalAffordance::new("Chess Club", "michael@mergington.edu");
    let outcome = controller.request_unregister(&affordance).await;
    assert_eq!(
        outcome,
        ActionOutcome::Failed("Failed to unregister. Please try again.".to_string())
    );
}

#[tokio::test]
async fn mutation_succeeds_even_if_refetch_fails() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();
    board.forget_calls();
    board.directory_down.store(true, Ordering::SeqCst);

    controller.fill_form("newstudent@mergington.edu", "Gym Class");
    let outcome = controller.submit_signup().await;

    assert_eq!(
        outcome,
        ActionOutcome::Succeeded("Signed up newstudent@mergington.edu for Gym Class".to_string())
    );
    let view = controller.view();
    assert_eq!(
        view.list.content(),
        &ListContent::LoadFailed(LOAD_FAILURE_TEXT.to_string())
    );
    // options survive from the earlier load, so no names read is made
    assert_eq!(view.selection.options().len(), 3);
    assert_eq!(view.form.email, "");
    assert_eq!(
        controller.banner().snapshot(),
        BannerSnapshot {
            feedback: Some(Feedback {
                kind: FeedbackKind::Success,
                text: "Signed up newstudent@mergington.edu for Gym Class".to_string()
            }),
            visible: true,
        }
    );
    assert_eq!(
        board.calls(),
        vec![
            "POST Gym Class/signup newstudent@mergington.edu",
            "GET /activities",
        ]
    );
}

#[tokio::test]
async fn double_unregister_both_reach_the_server() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();
    board.forget_calls();

    let affordance = RemovalAffordance::new("Chess Club", "daniel@mergington.edu");
    let (first, second) = futures::join!(
        controller.request_unregister(&affordance),
        controller.request_unregister(&affordance)
    );

    let mut outcomes = vec![first, second];
    outcomes.sort_by_key(|outcome| matches!(outcome, ActionOutcome::Failed(_)));
    assert_eq!(
        outcomes,
        vec![
            ActionOutcome::Succeeded("Unregistered daniel@mergington.edu from Chess Club".to_string()),
            ActionOutcome::Failed("Student is not signed up for this activity".to_string()),
        ]
    );
    assert_eq!(
        board
            .calls()
            .iter()
            .filter(|call| call.starts_with("DELETE"))
            .count(),
        2
    );
    assert_eq!(controller.pending_actions(), 0);
    assert_eq!(roster(&controller, "Chess Club"), vec!["michael@mergington.edu"]);
}

#[tokio::test]
async fn stale_refresh_is_discarded() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();

    let gate = board.arm_gate();
    let slow = controller.refresh();
    let fast = async {
        board
            .directory
            .lock()
            .unwrap()
            .get_mut("Gym Class")
            .unwrap()
            .participants
            .push("late@mergington.edu".to_string());
        let fast_result = controller.refresh().await;
        gate.notify_one();
        fast_result
    };
    let (slow_result, fast_result) = tokio::join!(slow, fast);

    assert!(slow_result.is_ok());
    assert!(fast_result.is_ok());
    // the slow read saw the roster before the signup and must not win
    assert_eq!(roster(&controller, "Gym Class"), vec!["late@mergington.edu"]);
    assert_eq!(
        controller.directory().unwrap().get("Gym Class").unwrap().participants,
        vec!["late@mergington.edu"]
    );
}

#[tokio::test]
async fn failed_load_shows_error_and_still_fills_options() {
    let board = TestBoard::new();
    board.directory_down.store(true, Ordering::SeqCst);
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);

    assert!(controller.load().await.is_err());

    let view = controller.view();
    assert_eq!(
        view.list.content(),
        &ListContent::LoadFailed(LOAD_FAILURE_TEXT.to_string())
    );
    assert_eq!(
        view.selection.options(),
        ["Chess Club", "Programming Class", "Gym Class"].map(String::from)
    );
    assert_eq!(
        board.calls(),
        vec!["GET /activities", "GET /activities (names)"]
    );
}

#[tokio::test]
async fn failed_load_and_names_leave_empty_selection() {
    let board = TestBoard::new();
    board.directory_down.store(true, Ordering::SeqCst);
    board.names_down.store(true, Ordering::SeqCst);
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);

    assert!(controller.load().await.is_err());
    assert!(controller.view().selection.is_empty());
    assert!(controller.directory().is_none());

    // the board recovers on the next refresh
    board.directory_down.store(false, Ordering::SeqCst);
    controller.refresh().await.unwrap();
    assert_eq!(controller.view().list.cards().len(), 3);
    assert_eq!(controller.view().selection.options().len(), 3);
}

#[tokio::test]
async fn selection_follows_directory_changes() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();

    board.directory.lock().unwrap().insert(
        "Art Studio",
        Activity {
            description: "Painting and drawing".to_string(),
            schedule: "Thursdays, 3:30 PM - 5:00 PM".to_string(),
            max_participants: 15,
            participants: vec![],
        },
    );
    controller.fill_form("amelia@mergington.edu", "Chess Club");
    controller.submit_signup().await;

    assert!(controller.view().selection.contains("Art Studio"));
}

#[tokio::test(start_paused = true)]
async fn banner_hides_after_last_message() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();

    controller.fill_form("newstudent@mergington.edu", "Gym Class");
    controller.submit_signup().await;
    tokio::time::sleep(Duration::from_secs(4)).await;

    controller.fill_form("newstudent@mergington.edu", "Gym Class");
    controller.submit_signup().await;
    tokio::time::sleep(Duration::from_secs(4)).await;
    let banner = controller.banner().snapshot();
    assert!(banner.visible);
    assert_eq!(banner.feedback.unwrap().kind, FeedbackKind::Error);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(!controller.banner().is_visible());
}

#[tokio::test]
async fn page_markup_follows_dom_contract() {
    let board = TestBoard::new();
    let confirmer = TestConfirmer::answering(true);
    let controller = controller(&board, &confirmer);
    controller.load().await.unwrap();
    controller.fill_form("a@x.com", "Chess Club");

    let html = controller.render_page_html();
    for needle in [
        "id=\"activities-list\"",
        "id=\"activity\"",
        "id=\"signup-form\"",
        "id=\"email\" value=\"a@x.com\"",
        "id=\"message\" class=\"hidden\"",
        "class=\"activity-card\"",
        "class=\"participants\"",
        "class=\"no-participants\"",
        "class=\"delete-icon\"",
        "<option value=\"Chess Club\" selected>Chess Club</option>",
    ] {
        assert!(html.contains(needle), "missing {}", needle);
    }
}
