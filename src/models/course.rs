use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub course: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub unit: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub section: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub pdf_file: Option<String>,
    #[serde(default)]
    pub order: i32,
}

impl Course {
    /// Orders units, sections and lessons by their `order` field. Ties keep
    /// the server order.
    pub fn sort_outline(&mut self) {
        self.units.sort_by_key(|u| u.order);
        for unit in &mut self.units {
            unit.sections.sort_by_key(|s| s.order);
            for section in &mut unit.sections {
                section.lessons.sort_by_key(|l| l.order);
            }
        }
    }

    pub fn lesson_count(&self) -> usize {
        self.units
            .iter()
            .flat_map(|u| &u.sections)
            .map(|s| s.lessons.len())
            .sum()
    }
}

fn default_active() -> bool {
    true
}
