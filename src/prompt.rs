//! # Prompt Module
//!
//! Yes/no confirmations. Every question defaults to "no": only a lone `Y` or `y`
//! (surrounding whitespace ignored) counts as consent.

use std::io::{self, BufRead, Write};
use log::debug;

/// Asks the user a yes/no question.
pub trait Prompter {
    fn confirm(&self, question: &str) -> bool;
}

/// Reads answers from standard input.
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn confirm(&self, question: &str) -> bool {
        print!("{} [Y/N]: ", question);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => parse_answer(&line),
            Err(e) => {
                debug!("Could not read answer, treating as 'no': {}", e);
                false
            }
        }
    }
}

/// Answers every question with yes (`--yes`).
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, question: &str) -> bool {
        println!("{} [Y/N]: Y (--yes)", question);
        true
    }
}

/// `true` only for a single `Y`/`y`.
pub fn parse_answer(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

/// Replays canned answers and records the questions asked.
/// Runs out of answers -> "no".
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: std::sync::Mutex<std::collections::VecDeque<bool>>,
    pub asked: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: std::sync::Mutex::new(answers.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn questions(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> bool {
        self.asked.lock().unwrap().push(question.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn only_single_y_is_consent() {
        assert!(parse_answer("Y"));
        assert!(parse_answer("y\n"));
        assert!(parse_answer("  y \r\n"));

        assert!(!parse_answer(""));
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("N"));
        assert!(!parse_answer("yes"));
        assert!(!parse_answer("yy"));
    }

    #[test]
    fn scripted_prompter_defaults_to_no_when_exhausted() {
        let prompter = ScriptedPrompter::answering(&[true]);
        assert!(prompter.confirm("first?"));
        assert!(!prompter.confirm("second?"));
        assert_eq!(prompter.questions(), vec!["first?", "second?"]);
    }

    proptest! {
        #[test]
        fn anything_but_y_is_refused(input in "\\PC*") {
            prop_assume!(input.trim() != "y" && input.trim() != "Y");
            prop_assert!(!parse_answer(&input));
        }
    }
}
