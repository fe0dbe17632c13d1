use crate::{
    directory::{
        models::{ClassRecord, Document, Role, StudentDocument},
        StudentDirectory,
    },
    error::BoardResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use tracing::info;

/// Directory backed by documents held in memory, usually loaded from a
/// fixture file exported from the store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    students: Vec<StudentDocument>,
    classes: HashMap<String, ClassRecord>,
}

impl InMemoryDirectory {
    pub fn new(students: Vec<StudentDocument>, classes: Vec<ClassRecord>) -> Self {
        Self {
            students,
            classes: classes.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    pub fn from_json(raw: &str) -> BoardResult<Self> {
        #[derive(Debug, Deserialize)]
        struct Fixture {
            #[serde(default)]
            students: Vec<Document<StudentDocument>>,
            #[serde(default)]
            classes: Vec<Document<ClassRecord>>,
        }

        let fixture = serde_json::from_str::<Fixture>(raw)?;
        Ok(Self::new(
            fixture.students.into_iter().map(|d| d.into_student()).collect(),
            fixture.classes.into_iter().map(|d| d.into_class()).collect(),
        ))
    }

    pub fn from_json_file(path: &Path) -> BoardResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let directory = Self::from_json(&raw)?;
        info!(
            "Loaded {} students and {} classes from {}.",
            directory.students.len(),
            directory.classes.len(),
            path.display()
        );
        Ok(directory)
    }
}

#[async_trait]
impl StudentDirectory for InMemoryDirectory {
    async fn list_students(&self, role: Role) -> BoardResult<Vec<StudentDocument>> {
        // Documents without a role predate the role field and are students.
        Ok(self
            .students
            .iter()
            .filter(|s| s.role.unwrap_or(Role::Student) == role)
            .cloned()
            .collect())
    }

    async fn get_class(&self, class_id: &str) -> BoardResult<Option<ClassRecord>> {
        Ok(self.classes.get(class_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "students": [
            {"id": "s1", "data": {"fullName": "An Vo", "classes": ["7A"]}},
            {"id": "t1", "data": {"fullName": "Ms. Hoa", "role": "teacher"}}
        ],
        "classes": [
            {"id": "7A", "data": {"name": "Grade 7A", "grade": 7, "studentIds": ["s1"], "studentCount": 1}}
        ]
    }"#;

    #[tokio::test]
    async fn lists_only_requested_role() {
        let directory = InMemoryDirectory::from_json(FIXTURE).unwrap();
        let students = directory.list_students(Role::Student).await.unwrap();

        assert_eq!(students.len(), 1);
        assert_eq!(students[0].uid, "s1");
    }

    #[tokio::test]
    async fn missing_class_is_none() {
        let directory = InMemoryDirectory::from_json(FIXTURE).unwrap();

        let class = directory.get_class("7A").await.unwrap().unwrap();
        assert_eq!(class.grade, 7);
        assert!(directory.get_class("9Z").await.unwrap().is_none());
    }
}
