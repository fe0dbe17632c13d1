use crate::{
    core::standings::{self, RankedEntry},
    directory::{
        models::{ClassRecord, StudentRecord, UNKNOWN_GRADE},
        StudentDirectory,
    },
    error::{BoardError, BoardResult},
    storage::DirectoryCache,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassLeaderboard {
    pub leaderboard: Vec<RankedEntry>,
    pub class_name: String,
    pub total_students: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeLeaderboard {
    pub leaderboard: Vec<RankedEntry>,
    pub grade: u8,
    pub total_students: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterLeaderboard {
    pub leaderboard: Vec<RankedEntry>,
    pub total_students: usize,
    pub grades: Vec<u8>,
}

/// The three leaderboards shown to a single student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllLeaderboards {
    // None when the student belongs to no class.
    pub class: Option<Envelope<ClassLeaderboard>>,
    // None when the student's grade is unknown.
    pub grade: Option<GradeLeaderboard>,
    pub center: CenterLeaderboard,
}

/// Serialized form of a `BoardResult`: `{"success": true, ...}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<BoardResult<T>> for Envelope<T> {
    fn from(result: BoardResult<T>) -> Self {
        match result {
            Ok(data) => Envelope {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Envelope {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Entry points of the ranking subsystem.
///
/// Directory listing failures are absorbed by the cache: queries then answer
/// with an empty leaderboard. Failures of the queries' own lookups (class
/// roster) are returned as errors.
#[derive(Clone)]
pub struct Leaderboards {
    cache: DirectoryCache,
    directory: Arc<dyn StudentDirectory>,
}

impl Leaderboards {
    pub fn new(cache: DirectoryCache) -> Self {
        let directory = cache.directory();
        Leaderboards { cache, directory }
    }

    pub async fn class_leaderboard(
        &self,
        class_id: &str,
        force_refresh: bool,
    ) -> BoardResult<ClassLeaderboard> {
        let class = self.roster(class_id).await?;
        // An empty roster needs no student data at all.
        if class.student_ids.is_empty() {
            return Ok(class_board(&[], &class));
        }

        let snapshot = self.cache.get(force_refresh).await;
        Ok(class_board(&snapshot, &class))
    }

    pub async fn grade_leaderboard(
        &self,
        grade: u8,
        force_refresh: bool,
    ) -> BoardResult<GradeLeaderboard> {
        let snapshot = self.cache.get(force_refresh).await;
        Ok(grade_board(&snapshot, grade))
    }

    pub async fn center_leaderboard(&self, force_refresh: bool) -> BoardResult<CenterLeaderboard> {
        let snapshot = self.cache.get(force_refresh).await;
        Ok(center_board(&snapshot))
    }

    /// Leaderboards of the student's first class, grade and the whole center,
    /// all computed from a single cache read.
    pub async fn all_leaderboards(
        &self,
        student_classes: &[String],
        student_grade: Option<u8>,
        force_refresh: bool,
    ) -> BoardResult<AllLeaderboards> {
        let first_class = student_classes.first();
        let roster_lookup = async {
            match first_class {
                Some(class_id) => Some(self.roster(class_id).await),
                None => None,
            }
        };
        let (snapshot, roster) = tokio::join!(self.cache.get(force_refresh), roster_lookup);

        // A missing or unreadable class only fails its own part of the answer.
        let class = roster
            .map(|roster| Envelope::from(roster.map(|class| class_board(&snapshot, &class))));
        let grade = student_grade
            .filter(|grade| *grade != UNKNOWN_GRADE)
            .map(|grade| grade_board(&snapshot, grade));
        let center = center_board(&snapshot);

        Ok(AllLeaderboards {
            class,
            grade,
            center,
        })
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Forces a refresh of the cached snapshot and ranks exactly what that
    /// refresh returned. A failed refresh gives an empty board, even when an
    /// older snapshot is still cached.
    pub async fn refresh(&self) -> CenterLeaderboard {
        let refreshed = self.cache.get(true).await;
        center_board(&refreshed)
    }

    pub fn snapshot_age(&self) -> Option<chrono::Duration> {
        self.cache.snapshot_age()
    }

    async fn roster(&self, class_id: &str) -> BoardResult<ClassRecord> {
        let lookup = timeout(
            self.cache.options().fetch_timeout,
            self.directory.get_class(class_id),
        )
        .await
        .map_err(|_| BoardError::Timeout)?;

        match lookup {
            Ok(Some(class)) => Ok(class),
            Ok(None) => {
                info!("Leaderboard requested for unknown class {class_id}.");
                Err(BoardError::NotFound(format!("class '{class_id}' does not exist")))
            }
            Err(e) => {
                warn!("Could not read roster of class {class_id}. {e}");
                Err(e)
            }
        }
    }
}

fn class_board(snapshot: &[StudentRecord], class: &ClassRecord) -> ClassLeaderboard {
    let leaderboard = standings::rank_by_class(snapshot, &class.id, &class.student_ids);
    ClassLeaderboard {
        total_students: leaderboard.len(),
        class_name: class.name.clone(),
        leaderboard,
    }
}

fn grade_board(snapshot: &[StudentRecord], grade: u8) -> GradeLeaderboard {
    let leaderboard = standings::rank_by_grade(snapshot, grade);
    GradeLeaderboard {
        total_students: leaderboard.len(),
        grade,
        leaderboard,
    }
}

fn center_board(snapshot: &[StudentRecord]) -> CenterLeaderboard {
    let leaderboard = standings::rank_center_wide(snapshot);
    CenterLeaderboard {
        total_students: leaderboard.len(),
        grades: standings::grades(snapshot),
        leaderboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_flattens_success_payload() {
        let result: BoardResult<GradeLeaderboard> = Ok(GradeLeaderboard {
            leaderboard: vec![],
            grade: 7,
            total_students: 0,
        });
        let json = serde_json::to_value(Envelope::from(result)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"success": true, "leaderboard": [], "grade": 7, "totalStudents": 0})
        );
    }

    #[test]
    fn envelope_carries_error_message() {
        let result: BoardResult<GradeLeaderboard> =
            Err(BoardError::NotFound("class '9Z' does not exist".to_string()));
        let json = serde_json::to_value(Envelope::from(result)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "Not Found: class '9Z' does not exist"})
        );
    }
}
