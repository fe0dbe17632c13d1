use crate::directory::models::StudentRecord;
use itertools::Itertools;
use serde::Serialize;
use std::{cmp::Reverse, collections::HashSet};
use tracing::debug;

// Student positioned within a leaderboard scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    #[serde(flatten)]
    pub student: StudentRecord,
    pub rank: usize,
    // Only set on the center-wide leaderboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_rank: Option<usize>,
}

// Sort is stable: students with equal points keep their snapshot order.
fn by_points_descending<'a>(
    students: impl Iterator<Item = &'a StudentRecord>,
) -> impl Iterator<Item = &'a StudentRecord> {
    students.sorted_by_key(|s| Reverse(s.total_behavior_points))
}

fn ranked<'a>(students: impl Iterator<Item = &'a StudentRecord>) -> Vec<RankedEntry> {
    students
        .enumerate()
        .map(|(idx, student)| RankedEntry {
            student: student.clone(),
            // idx is zero-based
            rank: idx + 1,
            grade_rank: None,
        })
        .collect()
}

pub fn rank_by_class(
    snapshot: &[StudentRecord],
    class_id: &str,
    member_uids: &[String],
) -> Vec<RankedEntry> {
    if member_uids.is_empty() {
        return vec![];
    }

    let members = member_uids.iter().map(String::as_str).collect::<HashSet<&str>>();
    let entries = ranked(by_points_descending(
        snapshot.iter().filter(|s| members.contains(s.uid.as_str())),
    ));
    debug!(
        "Ranked {} of {} members of class {class_id}.",
        entries.len(),
        members.len()
    );
    entries
}

pub fn rank_by_grade(snapshot: &[StudentRecord], grade: u8) -> Vec<RankedEntry> {
    ranked(by_points_descending(
        snapshot.iter().filter(|s| s.grade == grade),
    ))
}

/// Higher grades always outrank lower grades, whatever their points. Within a
/// grade, students are ordered by points.
pub fn rank_center_wide(snapshot: &[StudentRecord]) -> Vec<RankedEntry> {
    let per_grade = snapshot.iter().into_group_map_by(|s| s.grade);

    per_grade
        .into_iter()
        .sorted_unstable_by_key(|(grade, _)| Reverse(*grade))
        .flat_map(|(_grade, students)| {
            by_points_descending(students.into_iter())
                .enumerate()
                .map(|(idx, student)| (idx + 1, student))
                .collect::<Vec<(usize, &StudentRecord)>>()
        })
        .enumerate()
        .map(|(idx, (grade_rank, student))| RankedEntry {
            student: student.clone(),
            rank: idx + 1,
            grade_rank: Some(grade_rank),
        })
        .collect()
}

/// Distinct grades present in the snapshot, highest first.
pub fn grades(snapshot: &[StudentRecord]) -> Vec<u8> {
    snapshot
        .iter()
        .map(|s| s.grade)
        .unique()
        .sorted_unstable_by_key(|grade| Reverse(*grade))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::models::UNKNOWN_GRADE;

    fn student(uid: &str, points: i64, grade: u8) -> StudentRecord {
        StudentRecord {
            uid: uid.to_string(),
            full_name: format!("Student {uid}"),
            username: uid.to_string(),
            avatar: None,
            total_behavior_points: points,
            coins: 0,
            grade,
            classes: vec![],
        }
    }

    // points [10, 30, 30, 0, -5], grades [7, 7, 8, 7, 8]
    fn snapshot() -> Vec<StudentRecord> {
        vec![
            student("a", 10, 7),
            student("b", 30, 7),
            student("c", 30, 8),
            student("d", 0, 7),
            student("e", -5, 8),
        ]
    }

    fn points(entries: &[RankedEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.student.total_behavior_points).collect()
    }

    fn ranks(entries: &[RankedEntry]) -> Vec<usize> {
        entries.iter().map(|e| e.rank).collect()
    }

    #[test]
    fn grade_leaderboard_sorts_points_descending() {
        let entries = rank_by_grade(&snapshot(), 7);

        assert_eq!(points(&entries), vec![30, 10, 0]);
        assert_eq!(ranks(&entries), vec![1, 2, 3]);
        assert!(entries.iter().all(|e| e.grade_rank.is_none()));
    }

    #[test]
    fn empty_grade_group_is_empty_leaderboard() {
        assert!(rank_by_grade(&snapshot(), 12).is_empty());
        assert!(rank_by_grade(&[], 7).is_empty());
    }

    #[test]
    fn center_wide_puts_higher_grades_first() {
        let entries = rank_center_wide(&snapshot());

        let uids = entries.iter().map(|e| e.student.uid.as_str()).collect::<Vec<&str>>();
        assert_eq!(uids, vec!["c", "e", "b", "a", "d"]);
        assert_eq!(points(&entries), vec![30, -5, 30, 10, 0]);
        assert_eq!(ranks(&entries), vec![1, 2, 3, 4, 5]);

        let grade_ranks = entries.iter().map(|e| e.grade_rank).collect::<Vec<_>>();
        assert_eq!(
            grade_ranks,
            vec![Some(1), Some(2), Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    fn center_wide_grade_priority_holds_for_every_pair() {
        let mut students = snapshot();
        students.push(student("f", 500, UNKNOWN_GRADE));
        students.push(student("g", -100, 12));
        let entries = rank_center_wide(&students);

        for a in entries.iter() {
            for b in entries.iter() {
                if a.student.grade > b.student.grade {
                    assert!(a.rank < b.rank, "{} should outrank {}", a.student.uid, b.student.uid);
                }
            }
        }
        // Unknown grade comes last, whatever its points.
        assert_eq!(entries.last().map(|e| e.student.uid.as_str()), Some("f"));
    }

    #[test]
    fn class_leaderboard_keeps_only_members() {
        let members = vec!["a".to_string(), "c".to_string(), "e".to_string(), "ghost".to_string()];
        let entries = rank_by_class(&snapshot(), "mixed", &members);

        let uids = entries.iter().map(|e| e.student.uid.as_str()).collect::<Vec<&str>>();
        assert_eq!(uids, vec!["c", "a", "e"]);
        assert_eq!(ranks(&entries), vec![1, 2, 3]);
    }

    #[test]
    fn empty_roster_short_circuits() {
        assert!(rank_by_class(&snapshot(), "empty", &[]).is_empty());
    }

    #[test]
    fn ties_keep_snapshot_order_with_distinct_ranks() {
        let students = vec![student("x", 5, 3), student("y", 5, 3), student("z", 5, 3)];

        let entries = rank_by_grade(&students, 3);
        let uids = entries.iter().map(|e| e.student.uid.as_str()).collect::<Vec<&str>>();

        assert_eq!(uids, vec!["x", "y", "z"]);
        assert_eq!(ranks(&entries), vec![1, 2, 3]);
    }

    #[test]
    fn rankings_are_deterministic_and_contiguous() {
        let students = (0..40)
            .map(|i| student(&format!("s{i}"), (i * 7 % 11) as i64 - 5, (i % 4) as u8 + 5))
            .collect::<Vec<StudentRecord>>();

        let first = rank_center_wide(&students);
        assert_eq!(first, rank_center_wide(&students));
        assert_eq!(ranks(&first), (1..=students.len()).collect::<Vec<usize>>());

        for grade in grades(&students) {
            let entries = rank_by_grade(&students, grade);
            assert_eq!(entries, rank_by_grade(&students, grade));
            assert_eq!(ranks(&entries), (1..=entries.len()).collect::<Vec<usize>>());
            assert!(entries
                .windows(2)
                .all(|w| w[0].student.total_behavior_points >= w[1].student.total_behavior_points));
        }
    }

    #[test]
    fn grades_are_distinct_and_descending() {
        assert_eq!(grades(&snapshot()), vec![8, 7]);
        assert!(grades(&[]).is_empty());
    }
}
