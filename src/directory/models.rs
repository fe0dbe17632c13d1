use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Grade of a student whose classes could not be resolved.
pub const UNKNOWN_GRADE: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

// Student as stored in the document store. The grade is denormalized and may
// be missing, in which case it is resolved from the class memberships.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDocument {
    #[serde(skip)]
    pub uid: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub total_behavior_points: Option<i64>,
    #[serde(default)]
    pub coins: Option<i64>,
    #[serde(default)]
    pub grade: Option<u8>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl StudentDocument {
    /// Grade stored on the document itself, if any. A stored 0 counts as missing.
    pub fn stored_grade(&self) -> Option<u8> {
        self.grade.filter(|grade| *grade != UNKNOWN_GRADE)
    }

    pub fn into_record(self, grade: u8) -> StudentRecord {
        StudentRecord {
            uid: self.uid,
            full_name: self.full_name,
            username: self.username,
            avatar: self.avatar,
            total_behavior_points: self.total_behavior_points.unwrap_or_default(),
            coins: self.coins.unwrap_or_default(),
            grade,
            classes: self.classes,
        }
    }
}

// One student at a point in time, with its grade resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub uid: String,
    pub full_name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub total_behavior_points: i64,
    pub coins: i64,
    pub grade: u8,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub grade: u8,
    #[serde(default)]
    pub student_ids: Vec<String>,
    #[serde(default)]
    pub student_count: usize,
}

/// Envelope of a stored document: its id next to its fields.
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub id: String,
    pub data: T,
}

impl Document<StudentDocument> {
    pub fn into_student(self) -> StudentDocument {
        StudentDocument {
            uid: self.id,
            ..self.data
        }
    }
}

impl Document<ClassRecord> {
    pub fn into_class(self) -> ClassRecord {
        ClassRecord {
            id: self.id,
            ..self.data
        }
    }
}
