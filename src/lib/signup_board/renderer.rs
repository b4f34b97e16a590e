//! Turns directory data into activity cards, the list container that holds them
//! and the activity selection control of the signup form.
//!
//! Cards are plain values. Rendering a directory throws the previous cards away
//! and builds new ones, so the removal affordances always describe the roster
//! that is currently on screen.
use std::fmt;

use log::info;

use super::{
    helpers::escape_html,
    models::activity_model::{Activity, Directory},
};

pub const NO_PARTICIPANTS_TEXT: &str = "No participants yet";
pub const LOAD_FAILURE_TEXT: &str = "Failed to load activities. Please try again later.";
pub const LOADING_TEXT: &str = "Loading activities...";
pub const SELECT_PLACEHOLDER_TEXT: &str = "-- Select an activity --";

/// The per-participant "unregister" control, tagged with what it removes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemovalAffordance {
    pub activity: String,
    pub email: String,
}

impl RemovalAffordance {
    pub fn new(activity: impl Into<String>, email: impl Into<String>) -> Self {
        RemovalAffordance {
            activity: activity.into(),
            email: email.into(),
        }
    }

    pub fn title(&self) -> String {
        format!("Unregister {}", self.email)
    }

    pub fn confirmation_prompt(&self) -> String {
        format!(
            "Are you sure you want to unregister {} from {}?",
            self.email, self.activity
        )
    }

    fn to_html(&self) -> String {
        format!(
            "<span class=\"delete-icon\" data-activity=\"{}\" data-email=\"{}\" title=\"{}\">✕</span>",
            escape_html(&self.activity),
            escape_html(&self.email),
            escape_html(&self.title())
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub email: String,
    pub removal: RemovalAffordance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantsSection {
    Empty,
    Roster(Vec<ParticipantRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCard {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: i64,
    pub max_participants: u32,
    pub participants: ParticipantsSection,
}

impl ActivityCard {
    pub fn capacity_line(&self) -> String {
        format!("{} / {}", self.spots_left, self.max_participants)
    }

    pub fn removal_affordances(&self) -> impl Iterator<Item = &RemovalAffordance> {
        let rows: &[ParticipantRow] = match &self.participants {
            ParticipantsSection::Empty => &[],
            ParticipantsSection::Roster(rows) => rows,
        };
        rows.iter().map(|row| &row.removal)
    }

    pub fn to_html(&self) -> String {
        let participants = match &self.participants {
            ParticipantsSection::Empty => format!(
                "<ul><li class=\"no-participants\">{}</li></ul>",
                NO_PARTICIPANTS_TEXT
            ),
            ParticipantsSection::Roster(rows) => format!(
                "<ul>{}</ul>",
                rows.iter()
                    .map(|row| format!(
                        "<li>{} {}</li>",
                        escape_html(&row.email),
                        row.removal.to_html()
                    ))
                    .collect::<String>()
            ),
        };
        format!(
            "<div class=\"activity-card\"><h4>{}</h4><p><strong>Description:</strong> {}</p><p><strong>Schedule:</strong> {}</p><p><strong>Spots available:</strong> {}</p><div class=\"participants\"><h5>Participants:</h5>{}</div></div>",
            escape_html(&self.name),
            escape_html(&self.description),
            escape_html(&self.schedule),
            self.capacity_line(),
            participants
        )
    }
}

impl fmt::Display for ActivityCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  Description: {}", self.description)?;
        writeln!(f, "  Schedule: {}", self.schedule)?;
        writeln!(f, "  Spots available: {}", self.capacity_line())?;
        writeln!(f, "  Participants:")?;
        match &self.participants {
            ParticipantsSection::Empty => writeln!(f, "    {}", NO_PARTICIPANTS_TEXT),
            ParticipantsSection::Roster(rows) => rows
                .iter()
                .try_for_each(|row| writeln!(f, "    - {}", row.email)),
        }
    }
}

pub fn build_card(name: &str, activity: &Activity) -> ActivityCard {
    let participants = if activity.participants.is_empty() {
        ParticipantsSection::Empty
    } else {
        ParticipantsSection::Roster(
            activity
                .participants
                .iter()
                .map(|email| ParticipantRow {
                    email: email.clone(),
                    removal: RemovalAffordance::new(name, email.as_str()),
                })
                .collect(),
        )
    };

    ActivityCard {
        name: name.to_owned(),
        description: activity.description.clone(),
        schedule: activity.schedule.clone(),
        spots_left: activity.spots_left(),
        max_participants: activity.max_participants,
        participants,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListContent {
    #[default]
    Loading,
    Cards(Vec<ActivityCard>),
    LoadFailed(String),
}

/// The activities list container (`#activities-list`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListContainer {
    content: ListContent,
}

impl ListContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &ListContent {
        &self.content
    }

    pub fn clear(&mut self) {
        self.content = ListContent::Cards(Vec::new());
    }

    pub fn append(&mut self, card: ActivityCard) {
        match &mut self.content {
            ListContent::Cards(cards) => cards.push(card),
            _ => self.content = ListContent::Cards(vec![card]),
        }
    }

    /// Replaces whatever is shown with a single error paragraph.
    pub fn show_error(&mut self, text: impl Into<String>) {
        self.content = ListContent::LoadFailed(text.into());
    }

    pub fn cards(&self) -> &[ActivityCard] {
        match &self.content {
            ListContent::Cards(cards) => cards,
            _ => &[],
        }
    }

    pub fn removal_affordances(&self) -> impl Iterator<Item = &RemovalAffordance> {
        self.cards()
            .iter()
            .flat_map(|card| card.removal_affordances())
    }

    pub fn find_affordance(&self, activity: &str, email: &str) -> Option<&RemovalAffordance> {
        self.removal_affordances()
            .find(|affordance| affordance.activity == activity && affordance.email == email)
    }

    pub fn to_html(&self) -> String {
        let inner = match &self.content {
            ListContent::Loading => format!("<p>{}</p>", LOADING_TEXT),
            ListContent::Cards(cards) => cards.iter().map(ActivityCard::to_html).collect(),
            ListContent::LoadFailed(text) => {
                format!("<p class=\"error\">{}</p>", escape_html(text))
            }
        };
        format!("<div id=\"activities-list\">{}</div>", inner)
    }
}

impl fmt::Display for ListContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            ListContent::Loading => writeln!(f, "{}", LOADING_TEXT),
            ListContent::Cards(cards) => cards.iter().try_for_each(|card| writeln!(f, "{}", card)),
            ListContent::LoadFailed(text) => writeln!(f, "{}", text),
        }
    }
}

/// Clears the container, then appends one card per activity in directory order.
pub fn render_directory(container: &mut ListContainer, directory: &Directory) {
    container.clear();
    for (name, activity) in directory.iter() {
        container.append(build_card(name, activity));
    }
    info!("Rendered {} activity cards", directory.len());
}

/// The activity selection control (`#activity`) of the signup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionControl {
    options: Vec<String>,
}

impl SelectionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every option; never appends to a previous population.
    pub fn populate(&mut self, names: Vec<String>) {
        self.options = names;
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.iter().any(|option| option == name)
    }

    pub fn to_html(&self, selected: &str) -> String {
        let options = self
            .options
            .iter()
            .map(|name| {
                format!(
                    "<option value=\"{0}\"{1}>{0}</option>",
                    escape_html(name),
                    if name == selected { " selected" } else { "" }
                )
            })
            .collect::<String>();
        format!(
            "<select id=\"activity\" required><option value=\"\">{}</option>{}</select>",
            SELECT_PLACEHOLDER_TEXT, options
        )
    }
}
