pub mod display;
pub mod leaderboard;
pub mod standings;
pub mod templates;
