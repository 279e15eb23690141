use std::error::Error;

use services::quizzes::{QuizController, ResultView};
use services::{AppServices, CompletedQuiz, Countdown, NextStep, QuizServiceError, TickStep};
use tokio::io::{AsyncBufReadExt, BufReader};
use tutor_core::QuizFlowError;
use tutor_core::model::{AttemptId, ChatMessage, ScoreBand, TaskId};
use tutor_core::stats::Achievement;

type CmdResult = Result<(), Box<dyn Error>>;

pub async fn list_quizzes(app: &AppServices) -> CmdResult {
    let progress = app.progress();
    for quiz in app.catalog().list_quizzes().await? {
        let task_id = TaskId::from(quiz.id());
        let done = if progress.is_task_completed(&task_id).await? { "x" } else { " " };
        println!(
            "[{done}] {:<18} {} ({}, {}, {} questions, {} min)",
            quiz.id().as_str(),
            quiz.title(),
            quiz.category(),
            quiz.difficulty(),
            quiz.question_count(),
            quiz.time_limit_minutes(),
        );
    }
    Ok(())
}

pub async fn take_quiz(
    app: &AppServices,
    quiz_id: &str,
    answers: Option<Vec<Option<usize>>>,
) -> CmdResult {
    let slot = app.quiz_controller();
    let mut quizzes = slot.lock().await;
    let Some(attempt) = quizzes.start_quiz(quiz_id).await? else {
        eprintln!("no quiz with id {quiz_id:?}; try `quizzes`");
        return Ok(());
    };

    let completed = match answers {
        Some(answers) => run_scripted(&mut quizzes, &answers).await?,
        None => run_interactive(&mut quizzes, attempt).await?,
    };

    if let Some(view) = quizzes.result_view() {
        print_result(&view);
    }
    if completed.newly_completed {
        println!("Quiz marked as completed.");
    }
    Ok(())
}

async fn run_scripted(
    quizzes: &mut QuizController,
    answers: &[Option<usize>],
) -> Result<CompletedQuiz, QuizServiceError> {
    let mut index = 0;
    loop {
        if let Some(option) = answers.get(index).copied().flatten() {
            quizzes.select_answer(option)?;
        }
        match quizzes.next().await? {
            NextStep::Moved { index: next } => index = next,
            NextStep::Finished(completed) => return Ok(completed),
        }
    }
}

async fn run_interactive(
    quizzes: &mut QuizController,
    attempt: AttemptId,
) -> Result<CompletedQuiz, Box<dyn Error>> {
    let (countdown, mut ticks) = Countdown::spawn(attempt, Countdown::PERIOD);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Enter an option number to answer and continue, 'p' for previous, 'f' to finish.");
    print_question(quizzes);

    let completed = loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if let TickStep::Expired(completed) = quizzes.tick(tick.attempt).await? {
                    println!("Time is up!");
                    break completed;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break quizzes.finish().await?;
                };
                match line.trim() {
                    "f" => break quizzes.finish().await?,
                    "p" => quizzes.previous()?,
                    "" => {}
                    input => {
                        let Some(option) = input.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                            println!("Unrecognized input: {input}");
                            continue;
                        };
                        match quizzes.select_answer(option) {
                            Ok(()) => {}
                            Err(QuizServiceError::Flow(QuizFlowError::InvalidOption { count, .. })) => {
                                println!("Pick a number between 1 and {count}.");
                                continue;
                            }
                            Err(err) => return Err(err.into()),
                        }
                        if let NextStep::Finished(completed) = quizzes.next().await? {
                            break completed;
                        }
                    }
                }
                print_question(quizzes);
            }
        }
    };

    countdown.cancel();
    Ok(completed)
}

fn print_question(quizzes: &QuizController) {
    let Some(view) = quizzes.view() else {
        return;
    };
    println!();
    println!(
        "{} | question {}/{} | {} left",
        view.quiz_title, view.progress.position, view.progress.total, view.remaining
    );
    println!("{}", view.prompt);
    for (i, option) in view.options.iter().enumerate() {
        let marker = if view.selected == Some(i) { '*' } else { ' ' };
        println!(" {marker}{}. {option}", i + 1);
    }
}

fn print_result(view: &ResultView) {
    let band = match view.band {
        ScoreBand::High => "great",
        ScoreBand::Medium => "good",
        ScoreBand::Low => "keep practicing",
    };
    println!();
    println!("{}: {}% ({band})", view.quiz_title, view.score);
    println!(
        "{} of {} answers correct{}",
        view.correct_answers,
        view.total_questions,
        if view.expired { ", time ran out" } else { "" }
    );
    for (i, item) in view.items.iter().enumerate() {
        let mark = if item.is_correct { "ok" } else { "--" };
        println!("{mark} {}. {}", i + 1, item.prompt);
        if !item.is_correct {
            println!(
                "     your answer: {}; correct: {}",
                item.selected.as_deref().unwrap_or("none"),
                item.correct
            );
        }
        if !item.explanation.is_empty() {
            println!("     {}", item.explanation);
        }
    }
}

pub async fn show_profile(app: &AppServices) -> CmdResult {
    let summary = app.profile().summary(services::profile_service::DEFAULT_RECENT_LIMIT).await?;
    println!("Tests taken:     {}", summary.total_tests);
    println!("Average score:   {}%", summary.average_score);
    println!("Questions asked: {}", summary.questions_asked);
    println!("Tasks completed: {}", summary.completed_tasks);

    println!();
    println!("Recent activity:");
    if summary.recent.is_empty() {
        println!("  nothing yet");
    }
    for result in &summary.recent {
        println!(
            "  {} {:>3}%  {}",
            result.completed_at().format("%Y-%m-%d %H:%M"),
            result.score(),
            result.quiz_title()
        );
    }

    println!();
    println!("Achievements:");
    for (achievement, unlocked) in &summary.achievements {
        let mark = if *unlocked { "x" } else { " " };
        println!("  [{mark}] {}", achievement_label(*achievement));
    }
    Ok(())
}

fn achievement_label(achievement: Achievement) -> String {
    let hint = match achievement {
        Achievement::FirstSteps => "complete a quiz",
        Achievement::QuizMaster => "complete 5 quizzes",
        Achievement::HonorStudent => "average 80% or more",
    };
    format!("{} ({hint})", achievement.title())
}

pub async fn show_library(app: &AppServices, category: Option<&str>, search: &str) -> CmdResult {
    let library = app.library();
    let materials = library.list(category, search).await?;
    println!("Categories: {}", library.categories().await?.join(", "));
    println!("Found {} materials", materials.len());
    for material in materials {
        println!(
            "- {} [{} / {} / {}] {:.1}*{}",
            material.title(),
            material.category(),
            material.kind().as_str(),
            material.difficulty(),
            material.rating(),
            material
                .duration()
                .map(|d| format!(" {d}"))
                .unwrap_or_default()
        );
        println!("  {}", material.description());
    }
    Ok(())
}

pub async fn chat(app: &AppServices, message: &str) -> CmdResult {
    let chat = app.chat();
    if message.trim().is_empty() {
        for msg in chat.history().await? {
            print_message(&msg);
        }
        return Ok(());
    }

    if !chat.enabled() {
        eprintln!("TUTOR_CHAT_URL is not set; the tutor will not reply.");
    }
    for msg in chat.send_message(message).await? {
        print_message(&msg);
    }
    Ok(())
}

fn print_message(message: &ChatMessage) {
    let who = if message.is_user() { "you" } else { "tutor" };
    println!("{who}: {}", message.text());
    if let Some(task) = message.task() {
        println!(
            "      -> {} {} ({}, {}, {})",
            task.kind.as_str(),
            task.task_id,
            task.category,
            task.difficulty,
            task.estimated_time
        );
    }
}
