//! Interactive parameter resolution.
//!
//! Each declared parameter gets exactly one line of input, asked for in
//! declaration order. The line is trimmed, then:
//! - non-empty input wins over any default
//! - empty input falls back to the default
//! - empty input without a default resolves to an empty string

use crate::error::{Error, Result};
use crate::types::{DeclaredParameter, ResolvedParameter};
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Source of one line of operator input per parameter.
pub trait InputSource {
    /// Ask for a value for `parameter` and return the raw line.
    ///
    /// End of input is reported as an empty line.
    fn read_value(&mut self, parameter: &DeclaredParameter) -> std::io::Result<String>;
}

/// Prompt text shown for a parameter: `<description> - '<key>'(<default>):`.
pub fn prompt_text(parameter: &DeclaredParameter) -> String {
    format!(
        "{} - '{}'({}):",
        parameter.description,
        parameter.key,
        parameter.default.as_deref().unwrap_or_default()
    )
}

/// Reads one line per prompt from any buffered reader.
pub struct LineSource<R, W> {
    reader: R,
    prompt: W,
}

impl<R: BufRead, W: Write> LineSource<R, W> {
    /// Read lines from `reader`, writing prompts to `prompt`.
    pub fn new(reader: R, prompt: W) -> Self {
        Self { reader, prompt }
    }
}

impl<R: BufRead, W: Write> InputSource for LineSource<R, W> {
    fn read_value(&mut self, parameter: &DeclaredParameter) -> std::io::Result<String> {
        write!(self.prompt, "{}", prompt_text(parameter))?;
        self.prompt.flush()?;

        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line)
    }
}

/// Replays a fixed sequence of answers. An exhausted script yields empty
/// lines.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedSource {
    /// Create a source answering with `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Keys prompted for so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl InputSource for ScriptedSource {
    fn read_value(&mut self, parameter: &DeclaredParameter) -> std::io::Result<String> {
        self.asked.push(parameter.key.clone());
        Ok(self.answers.pop_front().unwrap_or_default())
    }
}

/// Resolve every declared parameter from `input`, preserving order.
pub fn resolve(
    declared: &[DeclaredParameter],
    input: &mut dyn InputSource,
) -> Result<Vec<ResolvedParameter>> {
    log::info!("Gathering {} parameter(s)", declared.len());

    declared
        .iter()
        .map(|parameter| {
            let raw = input.read_value(parameter).map_err(Error::Input)?;
            Ok(ResolvedParameter::new(
                &parameter.key,
                resolve_value(parameter, &raw),
            ))
        })
        .collect()
}

fn resolve_value(parameter: &DeclaredParameter, raw: &str) -> String {
    let text = raw.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    parameter.default.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn declared() -> Vec<DeclaredParameter> {
        vec![
            DeclaredParameter::new("KeyName", "SSH key"),
            DeclaredParameter::new("InstanceType", "EC2 type").with_default("t2.micro"),
            DeclaredParameter::new("Env", "Environment").with_default("dev"),
        ]
    }

    #[test]
    fn test_empty_input_uses_defaults() {
        let mut input = ScriptedSource::new(["", "", ""]);
        let resolved = resolve(&declared(), &mut input).unwrap();

        assert_eq!(resolved[1], ResolvedParameter::new("InstanceType", "t2.micro"));
        assert_eq!(resolved[2], ResolvedParameter::new("Env", "dev"));
    }

    #[test]
    fn test_empty_input_without_default_is_empty_string() {
        let mut input = ScriptedSource::new([""]);
        let resolved = resolve(&declared()[..1], &mut input).unwrap();

        assert_eq!(resolved, vec![ResolvedParameter::new("KeyName", "")]);
    }

    #[test]
    fn test_input_overrides_default_and_is_trimmed() {
        let mut input = ScriptedSource::new(["  ops-key \n", "m5.large\r\n", "\t prod"]);
        let resolved = resolve(&declared(), &mut input).unwrap();

        assert_eq!(
            resolved,
            vec![
                ResolvedParameter::new("KeyName", "ops-key"),
                ResolvedParameter::new("InstanceType", "m5.large"),
                ResolvedParameter::new("Env", "prod"),
            ]
        );
    }

    #[test]
    fn test_whitespace_only_input_counts_as_empty() {
        let mut input = ScriptedSource::new(["", "   \n"]);
        let resolved = resolve(&declared()[..2], &mut input).unwrap();

        assert_eq!(resolved[1].value, "t2.micro");
    }

    #[test]
    fn test_prompts_in_declaration_order_once_each() {
        let mut input = ScriptedSource::new(Vec::<String>::new());
        let resolved = resolve(&declared(), &mut input).unwrap();

        assert_eq!(input.asked(), ["KeyName", "InstanceType", "Env"]);
        let keys: Vec<_> = resolved.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["KeyName", "InstanceType", "Env"]);
    }

    #[test]
    fn test_no_parameters_prompts_nothing() {
        let mut input = ScriptedSource::new(["unused"]);
        let resolved = resolve(&[], &mut input).unwrap();

        assert!(resolved.is_empty());
        assert!(input.asked().is_empty());
    }

    #[test]
    fn test_line_source_reads_lines_and_writes_prompts() {
        let reader = Cursor::new("ops-key\n\n");
        let mut prompts = Vec::new();
        let resolved = {
            let mut input = LineSource::new(reader, &mut prompts);
            resolve(&declared(), &mut input).unwrap()
        };

        // Third read hits end of input and falls back to the default
        assert_eq!(resolved[0].value, "ops-key");
        assert_eq!(resolved[1].value, "t2.micro");
        assert_eq!(resolved[2].value, "dev");

        let shown = String::from_utf8(prompts).unwrap();
        assert!(shown.starts_with("SSH key - 'KeyName'():"));
        assert!(shown.contains("EC2 type - 'InstanceType'(t2.micro):"));
    }

    #[test]
    fn test_input_error_is_surfaced() {
        struct Broken;
        impl InputSource for Broken {
            fn read_value(&mut self, _: &DeclaredParameter) -> std::io::Result<String> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
        }

        let err = resolve(&declared(), &mut Broken).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
