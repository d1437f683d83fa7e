use serde::Serialize;

use super::schedule::WeeklySchedule;

#[derive(Debug, Clone, Serialize)]
pub struct Trainer {
    pub id: i64,
    pub name: String,
    pub class_id: i64,
    pub class_name: String,
    pub schedule: WeeklySchedule,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudioClass {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub about: String,
    pub syllabus: Vec<String>,
    pub level: String,
    pub length: String,
    pub group_size: String,
}
