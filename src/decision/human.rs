//! Console decision maker
//!
//! Renders the current state and its elements, then reads a menu choice.
//! Invalid input re-prompts; end of input stops the exploration.

use crate::decision::DecisionMaker;
use crate::graph::{ActionDecision, PageState};
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Outcome of asking for an element number
enum ElementChoice {
    Picked(String),
    /// The state has nothing to pick; the menu is shown again
    NoElements,
    EndOfInput,
}

/// Prompts a person for each action
pub struct HumanDecisionMaker<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanDecisionMaker<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consumes the decision maker, returning its output sink
    pub fn into_output(self) -> W {
        self.output
    }

    fn render(&mut self, state: &PageState) -> io::Result<()> {
        writeln!(self.output, "\n=== Current Page State ===")?;
        writeln!(self.output, "URL: {}", state.url)?;
        writeln!(self.output, "Title: {}", state.title)?;
        writeln!(self.output, "\nInteractive Elements:")?;

        for (i, element) in state.elements.iter().enumerate() {
            writeln!(self.output, "\n{}. Type: {}", i + 1, element.element_type)?;
            writeln!(self.output, "   ID: {}", element.element_id)?;
            writeln!(self.output, "   Text: {}", element.text)?;
            if element.accepts_text {
                let value = element
                    .field_id
                    .as_ref()
                    .and_then(|id| state.form_values.get(id))
                    .map(String::as_str)
                    .unwrap_or_default();
                writeln!(self.output, "   Current Value: {}", value)?;
            }
        }

        writeln!(self.output, "\nAvailable Actions:")?;
        writeln!(self.output, "1. Click an element")?;
        writeln!(self.output, "2. Input text")?;
        writeln!(self.output, "3. Hover over element")?;
        writeln!(self.output, "4. Scroll")?;
        writeln!(self.output, "5. Navigate to URL")?;
        writeln!(self.output, "6. Stop exploration")?;
        Ok(())
    }

    fn decide(&mut self, state: &PageState) -> io::Result<Option<ActionDecision>> {
        self.render(state)?;

        loop {
            let Some(choice) = self.read_line("\nChoose action (1-6): ")? else {
                return Ok(None);
            };

            let decision = match choice.trim() {
                "1" => match self.pick_element(state, "Choose element number: ")? {
                    ElementChoice::Picked(element_id) => Some(ActionDecision::click(element_id)),
                    ElementChoice::NoElements => continue,
                    ElementChoice::EndOfInput => None,
                },
                "2" => match self.pick_element(state, "Choose input element number: ")? {
                    ElementChoice::Picked(element_id) => self
                        .read_line("Enter input value: ")?
                        .map(|value| ActionDecision::input(element_id, value)),
                    ElementChoice::NoElements => continue,
                    ElementChoice::EndOfInput => None,
                },
                "3" => match self.pick_element(state, "Choose hover element number: ")? {
                    ElementChoice::Picked(element_id) => Some(ActionDecision::hover(element_id)),
                    ElementChoice::NoElements => continue,
                    ElementChoice::EndOfInput => None,
                },
                "4" => self
                    .read_number::<i64>("Enter scroll position (in pixels): ")?
                    .map(ActionDecision::scroll_to),
                "5" => self
                    .read_line("Enter URL to navigate to: ")?
                    .map(|url| ActionDecision::navigate(url.trim())),
                "6" => return Ok(None),
                _ => {
                    writeln!(self.output, "Invalid choice. Please try again.")?;
                    continue;
                }
            };

            return Ok(decision);
        }
    }

    /// Reads an element number
    fn pick_element(&mut self, state: &PageState, message: &str) -> io::Result<ElementChoice> {
        if state.elements.is_empty() {
            writeln!(self.output, "No interactive elements on this page.")?;
            return Ok(ElementChoice::NoElements);
        }

        loop {
            let Some(number) = self.read_number::<usize>(message)? else {
                return Ok(ElementChoice::EndOfInput);
            };
            match number.checked_sub(1).and_then(|i| state.elements.get(i)) {
                Some(element) => return Ok(ElementChoice::Picked(element.element_id.clone())),
                None => writeln!(
                    self.output,
                    "Choose a number between 1 and {}.",
                    state.elements.len()
                )?,
            }
        }
    }

    fn read_number<T: FromStr>(&mut self, message: &str) -> io::Result<Option<T>> {
        loop {
            let Some(line) = self.read_line(message)? else {
                return Ok(None);
            };
            match line.trim().parse() {
                Ok(number) => return Ok(Some(number)),
                Err(_) => writeln!(self.output, "Please enter a number.")?,
            }
        }
    }

    /// Prints `message` and reads one line without its terminator
    fn read_line(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead, W: Write> DecisionMaker for HumanDecisionMaker<R, W> {
    fn decide_next_action(&mut self, state: &PageState) -> Option<ActionDecision> {
        match self.decide(state) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!("Prompt failed: {}", e);
                None
            }
        }
    }

    fn should_continue_exploration(&mut self, _state: &PageState) -> bool {
        match self.read_line("\nContinue exploration? (y/n): ") {
            Ok(Some(answer)) => answer.trim().to_lowercase().starts_with('y'),
            Ok(None) => false,
            Err(e) => {
                tracing::error!("Prompt failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ElementSummary, ElementType};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn state() -> PageState {
        let mut form_values = BTreeMap::new();
        form_values.insert("q".to_string(), "rust".to_string());

        PageState {
            state_id: "state_1".to_string(),
            page_id: "page_0".to_string(),
            url: "https://site.test/".to_string(),
            title: "Search".to_string(),
            timestamp: Utc::now(),
            scroll_position: 0,
            form_values,
            elements: vec![
                ElementSummary {
                    element_id: "button_1".to_string(),
                    element_type: ElementType::Button,
                    text: "Go".to_string(),
                    accepts_text: false,
                    href: None,
                    field_id: None,
                },
                ElementSummary {
                    element_id: "text_input_1".to_string(),
                    element_type: ElementType::TextInput,
                    text: String::new(),
                    accepts_text: true,
                    href: None,
                    field_id: Some("q".to_string()),
                },
            ],
            action_history: vec![],
        }
    }

    fn maker(input: &str) -> HumanDecisionMaker<Cursor<Vec<u8>>, Vec<u8>> {
        HumanDecisionMaker::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_click_choice() {
        let mut human = maker("1\n1\n");
        assert_eq!(
            human.decide_next_action(&state()),
            Some(ActionDecision::click("button_1"))
        );
    }

    #[test]
    fn test_input_choice() {
        let mut human = maker("2\n2\nhello world\n");
        assert_eq!(
            human.decide_next_action(&state()),
            Some(ActionDecision::input("text_input_1", "hello world"))
        );
    }

    #[test]
    fn test_scroll_and_navigate() {
        let mut human = maker("4\n600\n");
        assert_eq!(
            human.decide_next_action(&state()),
            Some(ActionDecision::scroll_to(600))
        );

        let mut human = maker("5\n https://site.test/next \n");
        assert_eq!(
            human.decide_next_action(&state()),
            Some(ActionDecision::navigate("https://site.test/next"))
        );
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let mut human = maker("9\n3\nabc\n7\n2\n");
        assert_eq!(
            human.decide_next_action(&state()),
            Some(ActionDecision::hover("text_input_1"))
        );

        let output = String::from_utf8(human.into_output()).unwrap();
        assert!(output.contains("Invalid choice. Please try again."));
        assert!(output.contains("Please enter a number."));
        assert!(output.contains("Choose a number between 1 and 2."));
    }

    #[test]
    fn test_stop_and_eof() {
        assert_eq!(maker("6\n").decide_next_action(&state()), None);
        assert_eq!(maker("").decide_next_action(&state()), None);
        assert_eq!(maker("1\n").decide_next_action(&state()), None);
    }

    #[test]
    fn test_element_choice_without_elements_reprompts() {
        let mut empty = state();
        empty.elements.clear();

        let mut human = maker("1\n3\n4\n300\n");
        assert_eq!(
            human.decide_next_action(&empty),
            Some(ActionDecision::scroll_to(300))
        );

        let output = String::from_utf8(human.into_output()).unwrap();
        assert_eq!(output.matches("No interactive elements on this page.").count(), 2);
    }

    #[test]
    fn test_render_shows_current_values() {
        let mut human = maker("6\n");
        human.decide_next_action(&state());
        let output = String::from_utf8(human.into_output()).unwrap();
        assert!(output.contains("URL: https://site.test/"));
        assert!(output.contains("2. Type: text_input"));
        assert!(output.contains("Current Value: rust"));
    }

    #[test]
    fn test_should_continue() {
        assert!(maker("y\n").should_continue_exploration(&state()));
        assert!(maker("Yes\n").should_continue_exploration(&state()));
        assert!(!maker("n\n").should_continue_exploration(&state()));
        assert!(!maker("").should_continue_exploration(&state()));
    }
}
