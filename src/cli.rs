use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Parser, Serialize)]
#[command(name = "centerboard", about = "Behavior points leaderboards of the center")]
pub struct Cli {
    /// YAML settings file, `.env.local.yaml` is used when present
    #[arg(long, global = true)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// One of TRACE, DEBUG, INFO, WARN, ERROR
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_level: Option<String>,

    /// Base URL of the document store
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_base_url: Option<String>,

    /// Read students and classes from a JSON export instead of the store
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_fixture: Option<PathBuf>,

    /// Bypass the cached student snapshot
    #[arg(long, global = true)]
    #[serde(skip)]
    pub force: bool,

    #[arg(long, global = true, value_enum, default_value_t = Format::Json)]
    #[serde(skip)]
    pub format: Format,

    #[command(subcommand)]
    #[serde(skip)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Text,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Leaderboard of the members of a class
    Class { class_id: String },
    /// Leaderboard of every student of a grade
    Grade { grade: u8 },
    /// Leaderboard of the whole center, higher grades first
    Center,
    /// The class, grade and center leaderboards shown to one student
    Student {
        /// Class of the student, only the first one is ranked
        #[arg(long = "class")]
        classes: Vec<String>,
        #[arg(long)]
        grade: Option<u8>,
    },
    /// Keep the cache warm on the configured schedule until interrupted
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_student_command() {
        let cli = Cli::parse_from([
            "centerboard",
            "--format",
            "text",
            "student",
            "--class",
            "7A",
            "--class",
            "8B",
            "--grade",
            "8",
            "--force",
        ]);

        assert_eq!(cli.format, Format::Text);
        assert!(cli.force);
        match cli.command {
            Some(Command::Student { classes, grade }) => {
                assert_eq!(classes, vec!["7A", "8B"]);
                assert_eq!(grade, Some(8));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn only_settings_overrides_are_serialized() {
        let cli = Cli::parse_from(["centerboard", "--store-base-url", "http://store:9000", "center"]);
        let serialized = serde_json::to_value(&cli).unwrap();

        assert_eq!(
            serialized,
            serde_json::json!({"store_base_url": "http://store:9000"})
        );
    }
}
