use centerboard::core::leaderboard::Leaderboards;
use centerboard::core::templates;
use centerboard::directory::memory::InMemoryDirectory;
use centerboard::storage::{CacheOptions, DirectoryCache, SystemClock};
use std::path::Path;
use std::sync::Arc;

fn demo_leaderboards() -> Leaderboards {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/center.json");
    let directory = InMemoryDirectory::from_json_file(&path).expect("demo fixture loads");
    let cache = DirectoryCache::new(
        Arc::new(directory),
        CacheOptions::default(),
        Arc::new(SystemClock),
    );
    Leaderboards::new(cache)
}

#[tokio::test]
async fn demo_center_resolves_grades_from_classes() {
    let leaderboards = demo_leaderboards();

    let center = leaderboards.center_leaderboard(false).await.unwrap();
    let rows = center
        .leaderboard
        .iter()
        .map(|e| (e.student.username.as_str(), e.student.grade, e.rank, e.grade_rank))
        .collect::<Vec<_>>();

    // Teachers are not ranked; Em is in 8A and 7B and takes the highest grade.
    assert_eq!(
        rows,
        vec![
            ("chipham", 8, 1, Some(1)),
            ("emng", 8, 2, Some(2)),
            ("baole", 7, 3, Some(1)),
            ("anvo", 7, 4, Some(2)),
            ("dungho", 7, 5, Some(3)),
        ]
    );
    assert_eq!(center.grades, vec![8, 7]);
}

#[tokio::test]
async fn demo_student_boards_render_as_text() {
    let leaderboards = demo_leaderboards();

    let all = leaderboards
        .all_leaderboards(&["9A".to_string()], Some(7), false)
        .await
        .unwrap();
    let rendered = templates::all(&all).unwrap();

    assert!(rendered.starts_with(
        "🏫 Class leaderboard for *Grade 9 - A* (0 students):\nNo ranking data yet."
    ));
    assert!(rendered.contains("🎓 Grade 7 leaderboard (3 students):\n1st Bao Le:  30 pts"));
    assert!(rendered.contains("🏆 Center leaderboard (5 students, grades 8, 7):"));
}
