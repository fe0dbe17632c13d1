use crate::{core::standings::RankedEntry, directory::models::UNKNOWN_GRADE, utils::ordinal};
use itertools::Itertools;

fn grade_label(grade: u8) -> String {
    match grade {
        UNKNOWN_GRADE => "grade ?".to_string(),
        g => format!("grade {g}"),
    }
}

// Display leaderboard entries as aligned text rows
pub fn board(entries: &[RankedEntry]) -> String {
    // calculate width for positions
    // the width of the largest ordinal to be displayed
    let width_pos = entries
        .iter()
        .map(|e| ordinal(e.rank).len())
        .max()
        .unwrap_or_default();

    // calculate width for names
    // the length of the longest name, plus one for ':'
    let width_name = 1 + entries
        .iter()
        .map(|e| e.student.full_name.chars().count())
        .max()
        .unwrap_or_default();

    // calculate width for points, sign included
    let width_points = entries
        .iter()
        .map(|e| e.student.total_behavior_points.to_string().len())
        .max()
        .unwrap_or_default();

    entries
        .iter()
        .map(|e| {
            let name = format!("{}:", e.student.full_name);
            let row = format!(
                "{:>width_pos$} {:<width_name$} {:>width_points$} pts",
                ordinal(e.rank),
                name,
                e.student.total_behavior_points,
            );
            match e.grade_rank {
                Some(grade_rank) => format!(
                    "{row}  ({} in {})",
                    ordinal(grade_rank),
                    grade_label(e.student.grade)
                ),
                None => row,
            }
        })
        .join("\n")
}
