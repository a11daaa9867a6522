// src/command/model.rs

//! Lexical model of a free-form shell command.
//!
//! Tokenization is deliberately naive: sub-commands are split on `&&`,
//! tokens on whitespace, and at most one layer of `'`/`"` is stripped when a
//! token is inspected as a path. There is no shell grammar here; a quoted
//! argument containing spaces becomes several tokens.

/// Operator that sequences sub-commands.
pub const SEQUENCE_OPERATOR: &str = "&&";

/// A command line split into sub-commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    raw: String,
    sub_commands: Vec<SubCommand>,
}

impl CommandLine {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let sub_commands = raw
            .split(SEQUENCE_OPERATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SubCommand::parse)
            .collect();
        Self { raw, sub_commands }
    }

    /// The text as given by the caller.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn sub_commands(&self) -> &[SubCommand] {
        &self.sub_commands
    }

    pub fn is_empty(&self) -> bool {
        self.sub_commands.is_empty()
    }
}

/// Join sub-commands back into a single command line.
pub fn join_sub_commands<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(&format!(" {SEQUENCE_OPERATOR} "))
}

/// One `&&`-separated segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommand {
    text: String,
    tokens: Vec<String>,
}

impl SubCommand {
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_string();
        let tokens = text.split_whitespace().map(str::to_string).collect();
        Self { text, tokens }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// First token: the program being invoked.
    pub fn binary(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Every token after the binary name.
    pub fn arguments(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }
}

/// Strip a single leading and a single trailing quote character.
pub fn strip_quotes(token: &str) -> &str {
    let token = token.strip_prefix(['\'', '"']).unwrap_or(token);
    token.strip_suffix(['\'', '"']).unwrap_or(token)
}

/// Tokens starting with `-` are treated as flags and never as paths.
pub fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}
