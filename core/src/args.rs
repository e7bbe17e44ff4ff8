//! Typed command-line argument parsing.
//!
//! Applications declare their arguments in named groups; every application
//! additionally understands `-help` and the logging verbosity flags. Value
//! arguments consume the following token, consumed tokens are removed from
//! consideration and any leftover token is an error.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

/// Log verbosity selected on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

const VERBOSITY_FLAGS: [(&str, Verbosity); 6] = [
    ("-trace", Verbosity::Trace),
    ("-debug", Verbosity::Debug),
    ("-info", Verbosity::Info),
    ("-warn", Verbosity::Warn),
    ("-error", Verbosity::Error),
    ("-no-log", Verbosity::Off),
];

/// An argument's current (or default) value. The variant doubles as the
/// argument's type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(Option<String>),
}

/// Validator callback: inspects a parsed value, returns a user-facing
/// message when it is rejected.
pub type Validator = fn(&Value) -> Result<(), String>;

/// A single command-line argument.
pub struct Arg {
    pub name: &'static str,
    pub help: &'static str,
    pub value: Value,
    pub validator: Option<Validator>,
}

impl Arg {
    pub const fn flag(name: &'static str, help: &'static str) -> Arg {
        Arg {
            name,
            help,
            value: Value::Bool(false),
            validator: None,
        }
    }

    pub const fn int(name: &'static str, default: i64, help: &'static str) -> Arg {
        Arg {
            name,
            help,
            value: Value::Int(default),
            validator: None,
        }
    }

    pub const fn double(name: &'static str, default: f64, help: &'static str) -> Arg {
        Arg {
            name,
            help,
            value: Value::Double(default),
            validator: None,
        }
    }

    pub const fn string(name: &'static str, help: &'static str) -> Arg {
        Arg {
            name,
            help,
            value: Value::Str(None),
            validator: None,
        }
    }

    pub const fn validated_by(mut self, validator: Validator) -> Arg {
        self.validator = Some(validator);
        self
    }

    pub fn as_bool(&self) -> bool {
        match self.value {
            Value::Bool(v) => v,
            _ => false,
        }
    }

    pub fn as_int(&self) -> i64 {
        match self.value {
            Value::Int(v) => v,
            _ => 0,
        }
    }

    pub fn as_double(&self) -> f64 {
        match self.value {
            Value::Double(v) => v,
            _ => 0.0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::Str(v) => v.as_deref(),
            _ => None,
        }
    }
}

/// A titled group of arguments, shown as one section in the help text.
pub struct ArgGroup<'a> {
    pub title: &'static str,
    pub args: &'a mut [Arg],
}

/// Parse result for a valid command line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Run the application at the given verbosity.
    Run(Verbosity),
    /// `-help` was given; print the help text and exit.
    Help,
}

/// Errors for invalid command lines.
#[derive(Debug, PartialEq)]
pub enum ArgsError {
    MissingValue(&'static str),
    NotANumber { arg: &'static str, token: String },
    Unhandled(String),
    Invalid(String),
}

impl core::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArgsError::MissingValue(arg) => write!(f, "argument {arg} must be followed by a value"),
            ArgsError::NotANumber { arg, token } => {
                write!(f, "argument {arg} must be followed by a number, got \"{token}\"")
            }
            ArgsError::Unhandled(token) => write!(f, "unhandled parameter \"{token}\""),
            ArgsError::Invalid(message) => f.write_str(message),
        }
    }
}

/// Checks a numeric token: optional leading `-`, ASCII digits and (for
/// decimals) at most one interior `.` that is neither first nor last.
fn numeric_token(token: &str, allow_decimal: bool) -> bool {
    let rest = token.strip_prefix('-').unwrap_or(token);
    if rest.is_empty() {
        return false;
    }
    let mut digits = 0;
    let mut points = 0;
    let mut point_last = false;
    for ch in rest.chars() {
        point_last = false;
        if ch == '.' {
            if !allow_decimal || points > 0 || digits < 1 {
                return false;
            }
            points += 1;
            point_last = true;
        } else if !ch.is_ascii_digit() {
            return false;
        }
        digits += 1;
    }
    !point_last
}

/// Parses `tokens` (the command line without the program name) against the
/// given argument groups, updating argument values in place.
///
/// The verbosity flags are picked up anywhere on the line, the last one
/// winning. `-help` short-circuits into [`Outcome::Help`] before any group
/// is applied.
pub fn parse(tokens: &[String], groups: &mut [ArgGroup]) -> Result<Outcome, ArgsError> {
    let mut consumed = vec![false; tokens.len()];
    let mut verbosity = Verbosity::default();
    let mut help = false;

    for (index, token) in tokens.iter().enumerate() {
        if token == "-help" {
            help = true;
            consumed[index] = true;
            continue;
        }
        if let Some(&(_, level)) = VERBOSITY_FLAGS.iter().find(|(flag, _)| flag == token) {
            verbosity = level;
            consumed[index] = true;
        }
    }
    if help {
        return Ok(Outcome::Help);
    }

    for group in groups.iter_mut() {
        for index in 0..tokens.len() {
            if consumed[index] {
                continue;
            }
            let Some(arg) = group.args.iter_mut().find(|a| a.name == tokens[index]) else {
                continue;
            };
            consumed[index] = true;

            match &mut arg.value {
                Value::Bool(value) => *value = true,
                Value::Int(value) => {
                    let token = value_token(tokens, &mut consumed, index, arg.name)?;
                    if !numeric_token(token, false) {
                        return Err(ArgsError::NotANumber {
                            arg: arg.name,
                            token: token.to_string(),
                        });
                    }
                    *value = token.parse().map_err(|_| ArgsError::NotANumber {
                        arg: arg.name,
                        token: token.to_string(),
                    })?;
                }
                Value::Double(value) => {
                    let token = value_token(tokens, &mut consumed, index, arg.name)?;
                    if !numeric_token(token, true) {
                        return Err(ArgsError::NotANumber {
                            arg: arg.name,
                            token: token.to_string(),
                        });
                    }
                    *value = token.parse().map_err(|_| ArgsError::NotANumber {
                        arg: arg.name,
                        token: token.to_string(),
                    })?;
                }
                Value::Str(value) => {
                    let token = value_token(tokens, &mut consumed, index, arg.name)?;
                    *value = Some(token.to_string());
                }
            }

            if let Some(validate) = arg.validator {
                validate(&arg.value).map_err(ArgsError::Invalid)?;
            }
        }
    }

    for (token, &used) in tokens.iter().zip(consumed.iter()) {
        if !used {
            return Err(ArgsError::Unhandled(token.clone()));
        }
    }

    Ok(Outcome::Run(verbosity))
}

fn value_token<'t>(
    tokens: &'t [String],
    consumed: &mut [bool],
    index: usize,
    name: &'static str,
) -> Result<&'t str, ArgsError> {
    let next = index + 1;
    if next >= tokens.len() || consumed[next] {
        return Err(ArgsError::MissingValue(name));
    }
    consumed[next] = true;
    Ok(&tokens[next])
}

/// Renders the full help text: general options, logging options and one
/// section per argument group.
pub fn help_text(groups: &[ArgGroup]) -> String {
    let mut out = String::from(
        "General options:\n  -help    This text\n\nLogging options:\n  -trace   Set log threshold to TRACE\n  -debug   Set log threshold to DEBUG\n  -info    Set log threshold to INFO\n  -warn    Set log threshold to WARN\n  -error   Set log threshold to ERROR\n  -no-log  Disable logging\n",
    );

    for group in groups {
        out.push_str(&format!("\n{}:\n", group.title));
        let width = group.args.iter().map(|a| a.name.len()).max().unwrap_or(0);
        for arg in group.args.iter() {
            let typetext = match arg.value {
                Value::Bool(_) => "",
                Value::Int(_) => "<integer>",
                Value::Double(_) => "<decimal>",
                Value::Str(_) => "<string>",
            };
            let default = match &arg.value {
                Value::Bool(_) => String::new(),
                Value::Int(v) => format!(" [default: {v}]"),
                Value::Double(v) => format!(" [default: {v}]"),
                Value::Str(Some(v)) => format!(" [default: {v}]"),
                Value::Str(None) => String::new(),
            };
            out.push_str(&format!(
                "  {:<width$} {:<9} {}{}\n",
                arg.name, typetext, arg.help, default
            ));
        }
    }
    out.push('\n');
    out
}

/// Shared range check for integer arguments.
pub fn validate_int_range(value: &Value, field: &str, min: i64, max: i64) -> Result<(), String> {
    match value {
        Value::Int(v) if (min..=max).contains(v) => Ok(()),
        _ => Err(format!("{field} must be between {min} and {max}")),
    }
}

/// Shared range check for decimal arguments.
pub fn validate_double_range(value: &Value, field: &str, min: f64, max: f64) -> Result<(), String> {
    match value {
        Value::Double(v) if (min..=max).contains(v) => Ok(()),
        _ => Err(format!("{field} must be between {min} and {max}")),
    }
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(|t| t.to_string()).collect()
    }

    fn demo_args() -> [Arg; 4] {
        [
            Arg::flag("-verbose-output", "boolean parameter"),
            Arg::int("-count", 2, "integer parameter"),
            Arg::double("-ratio", 0.66, "decimal parameter"),
            Arg::string("-name", "string parameter"),
        ]
    }

    #[test]
    fn defaults_survive_empty_command_line() {
        let mut args = demo_args();
        let mut groups = [ArgGroup {
            title: "Test",
            args: &mut args,
        }];
        let outcome = parse(&[], &mut groups).unwrap();
        assert_eq!(outcome, Outcome::Run(Verbosity::Info));
        assert!(!groups[0].args[0].as_bool());
        assert_eq!(groups[0].args[1].as_int(), 2);
        assert_eq!(groups[0].args[2].as_double(), 0.66);
        assert_eq!(groups[0].args[3].as_str(), None);
    }

    #[test]
    fn parses_all_argument_types() {
        let mut args = demo_args();
        let mut groups = [ArgGroup {
            title: "Test",
            args: &mut args,
        }];
        let line = tokens("-verbose-output -count -7 -ratio 0.25 -name flake");
        parse(&line, &mut groups).unwrap();
        assert!(groups[0].args[0].as_bool());
        assert_eq!(groups[0].args[1].as_int(), -7);
        assert_eq!(groups[0].args[2].as_double(), 0.25);
        assert_eq!(groups[0].args[3].as_str(), Some("flake"));
    }

    #[test]
    fn last_verbosity_flag_wins() {
        let mut groups: [ArgGroup; 0] = [];
        let line = tokens("-trace -warn");
        assert_eq!(
            parse(&line, &mut groups).unwrap(),
            Outcome::Run(Verbosity::Warn)
        );
    }

    #[test]
    fn help_short_circuits() {
        let mut groups: [ArgGroup; 0] = [];
        let line = tokens("-help -bogus");
        assert_eq!(parse(&line, &mut groups).unwrap(), Outcome::Help);
    }

    #[test]
    fn unknown_token_is_an_error() {
        let mut args = demo_args();
        let mut groups = [ArgGroup {
            title: "Test",
            args: &mut args,
        }];
        let line = tokens("-verbose-output -bogus");
        assert_eq!(
            parse(&line, &mut groups).unwrap_err(),
            ArgsError::Unhandled("-bogus".to_string())
        );
    }

    #[test]
    fn value_argument_requires_a_token() {
        let mut args = demo_args();
        let mut groups = [ArgGroup {
            title: "Test",
            args: &mut args,
        }];
        assert_eq!(
            parse(&tokens("-count"), &mut groups).unwrap_err(),
            ArgsError::MissingValue("-count")
        );
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(numeric_token("12", false));
        assert!(numeric_token("-12", false));
        assert!(!numeric_token("1.5", false));
        assert!(numeric_token("1.5", true));
        assert!(numeric_token("-0.25", true));
        assert!(!numeric_token("1.", true));
        assert!(!numeric_token(".5", true));
        assert!(!numeric_token("1.2.3", true));
        assert!(!numeric_token("-", true));
        assert!(!numeric_token("12a", false));

        let mut args = demo_args();
        let mut groups = [ArgGroup {
            title: "Test",
            args: &mut args,
        }];
        assert!(matches!(
            parse(&tokens("-count 1.5"), &mut groups).unwrap_err(),
            ArgsError::NotANumber { arg: "-count", .. }
        ));
    }

    #[test]
    fn validator_rejects_out_of_range_value() {
        fn at_least_two(value: &Value) -> Result<(), String> {
            validate_int_range(value, "-count", 2, i64::MAX)
        }
        let mut args = [Arg::int("-count", 2, "integer parameter").validated_by(at_least_two)];
        let mut groups = [ArgGroup {
            title: "Test",
            args: &mut args,
        }];
        assert!(parse(&tokens("-count 5"), &mut groups).is_ok());
        assert!(matches!(
            parse(&tokens("-count 1"), &mut groups).unwrap_err(),
            ArgsError::Invalid(_)
        ));
    }

    #[test]
    fn help_text_lists_groups_and_defaults() {
        let mut args = demo_args();
        let groups = [ArgGroup {
            title: "Application-specific options",
            args: &mut args,
        }];
        let text = help_text(&groups);
        assert!(text.contains("Logging options:"));
        assert!(text.contains("Application-specific options:"));
        assert!(text.contains("-count"));
        assert!(text.contains("[default: 2]"));
        assert!(text.contains("<decimal>"));
    }
}
