use serde::{Deserialize, Serialize};

use super::NameRef;

/// User fields embedded in trainer and student records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trainer {
    pub id: i64,
    pub user: PersonUser,
    /// Center name as rendered by the backend.
    #[serde(default)]
    pub center: Option<String>,
    #[serde(default)]
    pub program: Option<i64>,
    #[serde(default)]
    pub program_name: Option<String>,
    /// Contract holder, `entraide` or `association`. The backend field name is misspelled.
    #[serde(default, rename = "contarct_with")]
    pub contract_with: Option<String>,
    #[serde(default)]
    pub contract_start_date: Option<String>,
    #[serde(default)]
    pub contract_end_date: Option<String>,
}

/// The student list renders `user` as its string form
/// (`"First Last - EXAM_ID"`); other endpoints nest the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentUser {
    Record(PersonUser),
    Label(String),
}

impl Default for StudentUser {
    fn default() -> Self {
        StudentUser::Label(String::new())
    }
}

impl StudentUser {
    pub fn display_name(&self) -> String {
        match self {
            StudentUser::Record(user) => format!("{} {}", user.first_name, user.last_name)
                .trim()
                .to_string(),
            StudentUser::Label(label) => label
                .split(" - ")
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        }
    }

    /// Text a search term is matched against.
    pub fn search_fields(&self) -> Vec<&str> {
        match self {
            StudentUser::Record(user) => vec![
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.email.as_str(),
            ],
            StudentUser::Label(label) => vec![label.as_str()],
        }
    }

    /// A bare label carries no status; such students count as active.
    pub fn is_active(&self) -> bool {
        match self {
            StudentUser::Record(user) => user.is_active,
            StudentUser::Label(_) => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    #[serde(default)]
    pub user: StudentUser,
    #[serde(default)]
    pub exam_id: String,
    #[serde(default)]
    pub center: Option<NameRef>,
    #[serde(default)]
    pub program: Option<NameRef>,
    #[serde(default)]
    pub group: Option<NameRef>,
    #[serde(default)]
    pub training_course: Option<NameRef>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub joining_date: Option<String>,
}

/// Trainer as returned by the schedule endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSummary {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

fn default_active() -> bool {
    true
}
