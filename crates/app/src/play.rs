use std::io::Write;

use quiz_core::model::{QuestionBank, QuizResult, SessionConfig, SubmitTrigger};
use quiz_core::time::format_countdown;
use services::{QuizEngine, QuizStatus, TickOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line typed during a running quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Next,
    Previous,
    Submit,
    Quit,
    Time,
    Help,
    Clear,
    Blank,
    Answer(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim() {
            ":n" | ":next" => Input::Next,
            ":p" | ":prev" => Input::Previous,
            ":s" | ":submit" => Input::Submit,
            ":q" | ":quit" => Input::Quit,
            ":t" | ":time" => Input::Time,
            ":h" | ":help" => Input::Help,
            ":c" | ":clear" => Input::Clear,
            "" => Input::Blank,
            _ => Input::Answer(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

fn print_help() {
    println!("Type your answer to replace the current one.");
    println!("  :n next question   :p previous question   :t time left");
    println!("  :c clear answer    :s submit          :q quit without grading");
}

fn print_current(engine: &QuizEngine) {
    let Some(session) = engine.session() else {
        return;
    };
    let question = session.current_question();
    println!();
    println!(
        "Question {}/{} [{} | {} | {} XP]  ({} left)",
        session.current_index() + 1,
        session.len(),
        question.topic(),
        question.difficulty(),
        question.base_xp(),
        format_countdown(session.countdown().remaining()),
    );
    println!("{}", question.prompt());
    if !session.current_answer().is_empty() {
        println!("Your answer: {}", session.current_answer());
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_result(bank: &QuestionBank, result: &QuizResult) {
    println!();
    match result.trigger() {
        SubmitTrigger::Manual => println!(
            "Submitted with {} to spare.",
            format_countdown(result.remaining_seconds())
        ),
        SubmitTrigger::Expired => println!("Time is up! Your answers were submitted."),
    }
    for (position, score) in result.scores().iter().enumerate() {
        println!(
            "{}. [{}] {}/{} marks",
            position + 1,
            score.topic,
            score.score,
            score.max_score
        );
        if score.answer.trim().is_empty() {
            println!("   (no answer)");
        } else {
            println!("   You wrote: {}", score.answer);
        }
        if let Some(question) = bank.get(score.question_id) {
            println!("   Model answer: {}", question.answer());
        }
    }
    println!(
        "Total: {}/{} marks",
        result.total_score(),
        result.max_score()
    );
}

async fn prompt_yes<R>(lines: &mut tokio::io::Lines<R>, question: &str) -> std::io::Result<bool>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("{question} [y/N] ");
    let _ = std::io::stdout().flush();
    Ok(lines
        .next_line()
        .await?
        .is_some_and(|line| matches!(line.trim(), "y" | "Y" | "yes")))
}

fn update_current(engine: &mut QuizEngine, text: String) -> Result<(), services::SessionError> {
    let index = engine
        .session()
        .map(|session| session.current_index())
        .unwrap_or_default();
    engine.update_answer(index, text)
}

pub(crate) async fn run(
    engine: &mut QuizEngine,
    config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if engine.check_progress().await == QuizStatus::AllSolved {
        println!("You have already solved every question in this bank.");
        if !prompt_yes(&mut lines, "Reset progress and start over?").await? {
            return Ok(());
        }
        engine.reset().await?;
    }

    loop {
        match engine.start(config).await? {
            QuizStatus::Active => {}
            QuizStatus::AllSolved => {
                println!("Every question is solved. Run `reset` to start over.");
                return Ok(());
            }
            status => {
                println!("No quiz available ({status}).");
                return Ok(());
            }
        }
        print_help();
        print_current(engine);

        let mut warned_low = false;
        let result = loop {
            tokio::select! {
                line = lines.next_line() => {
                    // Already graded by expiry; show it instead of editing.
                    if let Some(result) = engine.result() {
                        break result.clone();
                    }
                    let Some(line) = line? else {
                        engine.abandon()?;
                        println!();
                        return Ok(());
                    };
                    match Input::parse(&line) {
                        Input::Next => { engine.next()?; }
                        Input::Previous => { engine.previous()?; }
                        Input::Submit => break engine.submit().await?,
                        Input::Quit => {
                            engine.abandon()?;
                            println!("Quiz abandoned; nothing was graded.");
                            return Ok(());
                        }
                        Input::Time | Input::Blank => {}
                        Input::Help => print_help(),
                        Input::Clear => update_current(engine, String::new())?,
                        Input::Answer(text) => update_current(engine, text)?,
                    }
                    print_current(engine);
                }
                tick = engine.next_tick() => {
                    match tick? {
                        TickOutcome::Running { .. } => {
                            let low = engine
                                .session()
                                .is_some_and(|session| session.countdown().is_running_low());
                            if low && !warned_low {
                                warned_low = true;
                                println!();
                                println!("Hurry up, less than 30 seconds left!");
                                print_current(engine);
                            }
                        }
                        TickOutcome::Expired(result) => break result,
                    }
                }
            }
        };

        engine.flush_progress().await;
        print_result(engine.bank(), &result);
        if engine.bank_exhausted() {
            println!("You have now solved every question in this bank.");
            return Ok(());
        }
        if !prompt_yes(&mut lines, "Play another round?").await? {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Input::parse(":n"), Input::Next);
        assert_eq!(Input::parse(" :prev "), Input::Previous);
        assert_eq!(Input::parse(":s"), Input::Submit);
        assert_eq!(Input::parse(":q"), Input::Quit);
        assert_eq!(Input::parse(":t"), Input::Time);
        assert_eq!(Input::parse(":c"), Input::Clear);
    }

    #[test]
    fn blank_lines_do_not_touch_the_answer() {
        assert_eq!(Input::parse(""), Input::Blank);
        assert_eq!(Input::parse("   \r"), Input::Blank);
    }

    #[test]
    fn anything_else_is_an_answer() {
        assert_eq!(
            Input::parse("light is absorbed\r"),
            Input::Answer("light is absorbed".into())
        );
        assert_eq!(Input::parse(":x"), Input::Answer(":x".into()));
    }
}
