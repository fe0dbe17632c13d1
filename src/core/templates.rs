use crate::{
    core::{
        display,
        leaderboard::{AllLeaderboards, CenterLeaderboard, ClassLeaderboard, GradeLeaderboard},
    },
    error::BoardResult,
};
use minijinja::{context, Environment, Template};
use once_cell::sync::Lazy;
use strum::{EnumIter, IntoEnumIterator};
use tracing::{error, info};

static TEMPLATES_ENVIRONMENT: Lazy<Environment> = Lazy::new(|| {
    info!("Initializing templating engine environment.");
    let mut env = Environment::new();

    // Use strum to iterate over the variants of the enum.
    for template in BoardTemplate::iter() {
        if let Err(e) = env.add_template(template.name(), template.template()) {
            error!("Could not load template {}. {e}", template.name());
        }
    }

    env
});

#[derive(Debug, Clone, Copy, EnumIter)]
pub enum BoardTemplate {
    Class,
    Grade,
    Center,
    Unavailable,
}

impl BoardTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            BoardTemplate::Class => "class.txt",
            BoardTemplate::Grade => "grade.txt",
            BoardTemplate::Center => "center.txt",
            BoardTemplate::Unavailable => "unavailable.txt",
        }
    }

    pub fn get(&self) -> BoardResult<Template<'static, 'static>> {
        Ok(TEMPLATES_ENVIRONMENT.get_template(self.name())?)
    }

    pub fn template(&self) -> &'static str {
        // An empty leaderboard has its own message: it is neither loading nor failing.
        match self {
            BoardTemplate::Class => {
                "🏫 Class leaderboard for *{{ class_name }}* ({{ total }} student{{ 's' if total != 1 }}):\n\
                {% if total == 0 %}No ranking data yet.{% else %}{{ board }}{% endif %}"
            }
            BoardTemplate::Grade => {
                "🎓 Grade {{ grade }} leaderboard ({{ total }} student{{ 's' if total != 1 }}):\n\
                {% if total == 0 %}No ranking data yet.{% else %}{{ board }}{% endif %}"
            }
            BoardTemplate::Center => {
                "🏆 Center leaderboard ({{ total }} student{{ 's' if total != 1 }}{% if grades %}, grades {{ grades|join(', ') }}{% endif %}):\n\
                {% if total == 0 %}No ranking data yet.{% else %}{{ board }}{% endif %}"
            }
            BoardTemplate::Unavailable => {
                "⚠️ {{ scope }} leaderboard unavailable: {{ reason }}"
            }
        }
    }
}

pub fn class(leaderboard: &ClassLeaderboard) -> BoardResult<String> {
    Ok(BoardTemplate::Class.get()?.render(context! {
        class_name => leaderboard.class_name,
        total => leaderboard.total_students,
        board => display::board(&leaderboard.leaderboard),
    })?)
}

pub fn grade(leaderboard: &GradeLeaderboard) -> BoardResult<String> {
    Ok(BoardTemplate::Grade.get()?.render(context! {
        grade => leaderboard.grade,
        total => leaderboard.total_students,
        board => display::board(&leaderboard.leaderboard),
    })?)
}

pub fn center(leaderboard: &CenterLeaderboard) -> BoardResult<String> {
    Ok(BoardTemplate::Center.get()?.render(context! {
        grades => leaderboard.grades,
        total => leaderboard.total_students,
        board => display::board(&leaderboard.leaderboard),
    })?)
}

pub fn unavailable(scope: &str, reason: &str) -> BoardResult<String> {
    Ok(BoardTemplate::Unavailable.get()?.render(context! {
        scope => scope,
        reason => reason,
    })?)
}

pub fn all(leaderboards: &AllLeaderboards) -> BoardResult<String> {
    let mut sections = vec![];

    if let Some(envelope) = &leaderboards.class {
        match (&envelope.data, &envelope.error) {
            (Some(leaderboard), _) => sections.push(class(leaderboard)?),
            (None, reason) => sections.push(unavailable(
                "Class",
                reason.as_deref().unwrap_or("unknown error"),
            )?),
        }
    }
    if let Some(leaderboard) = &leaderboards.grade {
        sections.push(grade(leaderboard)?);
    }
    sections.push(center(&leaderboards.center)?);

    Ok(sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{leaderboard::Envelope, standings::RankedEntry},
        directory::models::StudentRecord,
        error::BoardError,
    };

    fn entry(name: &str, points: i64, rank: usize) -> RankedEntry {
        RankedEntry {
            student: StudentRecord {
                uid: name.to_lowercase(),
                full_name: name.to_string(),
                username: name.to_lowercase(),
                avatar: None,
                total_behavior_points: points,
                coins: 0,
                grade: 7,
                classes: vec!["7A".to_string()],
            },
            rank,
            grade_rank: None,
        }
    }

    #[test]
    fn all_templates_load() {
        for template in BoardTemplate::iter() {
            assert!(template.get().is_ok(), "{} failed to load", template.name());
        }
    }

    #[test]
    fn empty_class_renders_no_data_state() {
        let rendered = class(&ClassLeaderboard {
            leaderboard: vec![],
            class_name: "7A".to_string(),
            total_students: 0,
        })
        .unwrap();

        assert_eq!(
            rendered,
            "🏫 Class leaderboard for *7A* (0 students):\nNo ranking data yet."
        );
    }

    #[test]
    fn grade_renders_rows() {
        let rendered = grade(&GradeLeaderboard {
            leaderboard: vec![entry("Mai", 12, 1)],
            grade: 7,
            total_students: 1,
        })
        .unwrap();

        assert_eq!(rendered, "🎓 Grade 7 leaderboard (1 student):\n1st Mai: 12 pts");
    }

    #[test]
    fn failed_class_part_is_reported_next_to_other_boards() {
        let leaderboards = AllLeaderboards {
            class: Some(Envelope::from(Err::<ClassLeaderboard, _>(BoardError::NotFound(
                "class '9Z' does not exist".to_string(),
            )))),
            grade: None,
            center: CenterLeaderboard {
                leaderboard: vec![entry("Mai", 12, 1)],
                total_students: 1,
                grades: vec![7],
            },
        };
        let rendered = all(&leaderboards).unwrap();

        assert!(rendered.starts_with(
            "⚠️ Class leaderboard unavailable: Not Found: class '9Z' does not exist"
        ));
        assert!(rendered.ends_with("🏆 Center leaderboard (1 student, grades 7):\n1st Mai: 12 pts"));
    }
}
