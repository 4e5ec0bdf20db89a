//! Operator input for template parameters.

use stackkit::DeclaredParameter;
use stackkit::resolver::{InputSource, LineSource, prompt_text};
use std::io::{self, IsTerminal};

/// Prompts on the terminal through dialoguer.
pub struct TerminalSource;

impl InputSource for TerminalSource {
    fn read_value(&mut self, parameter: &DeclaredParameter) -> io::Result<String> {
        let prompt = prompt_text(parameter);
        dialoguer::Input::<String>::new()
            .with_prompt(prompt.trim_end_matches(':'))
            .allow_empty(true)
            .interact_text()
            .map_err(io::Error::other)
    }
}

/// Pick the input source for this process: dialoguer on a terminal,
/// plain line reads from stdin otherwise.
pub fn input_source() -> Box<dyn InputSource> {
    if io::stdin().is_terminal() {
        Box::new(TerminalSource)
    } else {
        log::debug!("stdin is not a terminal, reading parameters line by line");
        Box::new(LineSource::new(io::stdin().lock(), io::stderr()))
    }
}
