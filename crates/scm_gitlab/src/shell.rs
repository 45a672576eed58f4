//! Building blocks for composed POSIX shell commands.
//!
//! A [`CommandSequence`] is an ordered list of fragments joined once with `&&`, so the
//! first failing fragment stops the whole command. The helper functions produce single
//! fragments; none of them touch the environment, they only emit text the shell evaluates
//! later.

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;

/// Separator between fragments; any failing step aborts the rest.
pub const FRAGMENT_SEPARATOR: &str = " && ";

/// Environment variable holding the command prefix used to run git.
pub const GIT_WRAPPER_VAR: &str = "SD_GIT_WRAPPER";

/// An ordered, append-only list of shell fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSequence {
    fragments: Vec<String>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sequence with `fragment` appended.
    pub fn then(mut self, fragment: impl Into<String>) -> Self {
        self.fragments.push(fragment.into());
        self
    }

    /// Returns the sequence with every fragment of `fragments` appended, in order.
    pub fn then_all<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments
            .extend(fragments.into_iter().map(Into::into));
        self
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Joins all fragments into one command.
    pub fn join(&self) -> String {
        self.fragments.join(FRAGMENT_SEPARATOR)
    }
}

/// `if <condition>; then <then>; fi`
pub fn if_then(condition: &str, then: &str) -> String {
    format!("if {condition}; then {then}; fi")
}

/// `if <condition>; then <then>; else <otherwise>; fi`
pub fn if_then_else(condition: &str, then: &str, otherwise: &str) -> String {
    format!("if {condition}; then {then}; else {otherwise}; fi")
}

/// Test that `var` is set to a non-empty value.
pub fn is_set(var: &str) -> String {
    format!("[ ! -z \"${var}\" ]")
}

/// Test that `var` is unset or empty.
pub fn is_unset(var: &str) -> String {
    format!("[ -z \"${var}\" ]")
}

/// Test that `var` equals the literal `value`.
pub fn equals(var: &str, value: &str) -> String {
    format!("[ \"${var}\" = {} ]", shell_word(value))
}

/// `export NAME=value`, where `value` is emitted verbatim so it may reference variables.
pub fn export(name: &str, value: &str) -> String {
    format!("export {name}={value}")
}

/// `echo` of a literal message.
pub fn echo(message: &str) -> String {
    format!("echo {}", shell_word(message))
}

/// Runs `git_command` through the runtime-selected git wrapper.
///
/// The command is passed as a double-quoted string, so `$VAR` references inside it are
/// expanded before the wrapper runs. Literal values must be escaped with [`git_arg`].
pub fn git(git_command: &str) -> String {
    format!("${GIT_WRAPPER_VAR} \"{git_command}\"")
}

/// Quotes a literal so it survives as one word.
///
/// Values made of characters the shell treats literally are returned unchanged; anything
/// else is wrapped in single quotes.
pub fn shell_word(value: &str) -> String {
    let is_plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if is_plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Quotes a literal for use inside the double-quoted argument of [`git`].
pub fn git_arg(value: &str) -> String {
    let mut escaped = String::new();
    for c in shell_word(value).chars() {
        if matches!(c, '"' | '$' | '`' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
