//! Keyword rules mapping a learner's message to catalog entries.

use std::sync::Arc;

use tutor_core::model::{Material, Quiz, TaskSuggestion};

/// A tutor message proposing a quiz or material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub task: TaskSuggestion,
}

enum Pick {
    Quiz(&'static str),
    Material(&'static str),
}

struct Rule {
    keywords: &'static [&'static str],
    category: &'static str,
    picks: &'static [Pick],
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["алгебра", "уравнение", "математика", "algebra", "equation", "math"],
        category: "Mathematics",
        picks: &[Pick::Quiz(
            "Want to check your algebra skills? I have a quiz ready for you!",
        )],
    },
    Rule {
        keywords: &["физика", "сила", "движение", "physics", "force", "motion"],
        category: "Physics",
        picks: &[
            Pick::Quiz("Let's study some physics and take a quiz!"),
            Pick::Material("I also recommend this material on the laws of motion:"),
        ],
    },
    Rule {
        keywords: &["химия", "атом", "элемент", "chemistry", "atom", "element"],
        category: "Chemistry",
        picks: &[Pick::Quiz("Test what you know about atomic structure!")],
    },
    Rule {
        keywords: &["биология", "клетка", "организм", "biology", "cell", "organism"],
        category: "Biology",
        picks: &[
            Pick::Material("I recommend this reading on cell biology:"),
            Pick::Quiz("Then check yourself with the cell structure quiz!"),
        ],
    },
];

/// Suggestions for `text`, in rule order. Each matching rule offers the first
/// quiz and/or material of its category; a missing entry is skipped.
#[must_use]
pub fn suggest_tasks(text: &str, quizzes: &[Arc<Quiz>], materials: &[Material]) -> Vec<Suggestion> {
    let lower = text.to_lowercase();
    let mut out = Vec::new();

    for rule in RULES {
        if !rule.keywords.iter().any(|k| lower.contains(k)) {
            continue;
        }
        for pick in rule.picks {
            let suggestion = match pick {
                Pick::Quiz(text) => quizzes
                    .iter()
                    .find(|q| q.category() == rule.category)
                    .map(|q| (*text, TaskSuggestion::for_quiz(q))),
                Pick::Material(text) => materials
                    .iter()
                    .find(|m| m.category() == rule.category)
                    .map(|m| (*text, TaskSuggestion::for_material(m))),
            };
            if let Some((text, task)) = suggestion {
                out.push(Suggestion {
                    text: text.to_owned(),
                    task,
                });
            }
        }
    }
    out
}
