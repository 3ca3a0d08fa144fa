//! Command and reply type definitions for the NAD control protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Operator character of a command or reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `=`: set the variable to the attached value.
    Equals,
    /// `+`: step the variable up.
    Increment,
    /// `-`: step the variable down.
    Decrement,
    /// `?`: query the current value.
    Query,
}

impl Operator {
    /// The wire character for this operator.
    pub fn as_char(self) -> char {
        match self {
            Operator::Equals => '=',
            Operator::Increment => '+',
            Operator::Decrement => '-',
            Operator::Query => '?',
        }
    }

    /// Parse a wire character into an operator.
    pub fn from_char(c: char) -> Result<Self, ProtocolError> {
        match c {
            '=' => Ok(Operator::Equals),
            '+' => Ok(Operator::Increment),
            '-' => Ok(Operator::Decrement),
            '?' => Ok(Operator::Query),
            other => Err(ProtocolError::UnknownOperator(other)),
        }
    }

    /// True if the character is one of the four operator characters.
    pub fn is_operator_char(c: char) -> bool {
        matches!(c, '=' | '+' | '-' | '?')
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single protocol operation: variable, operator and optional value.
///
/// A command is valid iff an `=` operator carries a non-empty value and the
/// `+`/`-`/`?` operators carry none. Invalid commands must never reach the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub variable: String,
    pub operator: Operator,
    pub value: String,
}

impl Command {
    /// Build a `Variable=Value` command.
    pub fn set(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Command {
            variable: variable.into(),
            operator: Operator::Equals,
            value: value.into(),
        }
    }

    /// Build a `Variable?` query command.
    pub fn query(variable: impl Into<String>) -> Self {
        Command {
            variable: variable.into(),
            operator: Operator::Query,
            value: String::new(),
        }
    }

    /// Build a `Variable+`/`Variable-` step command.
    pub fn step(variable: impl Into<String>, up: bool) -> Self {
        Command {
            variable: variable.into(),
            operator: if up {
                Operator::Increment
            } else {
                Operator::Decrement
            },
            value: String::new(),
        }
    }

    /// Build a `Variable=On`/`Variable=Off` command.
    pub fn toggle(variable: impl Into<String>, on: bool) -> Self {
        Command::set(variable, if on { "On" } else { "Off" })
    }

    /// Check the command invariant: `=` requires a value, the other
    /// operators forbid one. The variable must be non-empty.
    pub fn valid(&self) -> bool {
        if self.variable.is_empty() {
            return false;
        }
        match self.operator {
            Operator::Equals => !self.value.is_empty(),
            Operator::Increment | Operator::Decrement | Operator::Query => self.value.is_empty(),
        }
    }

    /// True if sending this command may change the volume level.
    pub fn adjusts_volume(&self) -> bool {
        self.variable.eq_ignore_ascii_case("volume") && self.operator != Operator::Query
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.variable, self.operator, self.value)
    }
}

/// A reply parsed from the raw bytes the amplifier sends back.
///
/// For volume step replies the amplifier echoes the resulting level in the
/// operator position of the frame; [`Reply::volume`] carries that text as a
/// dedicated field instead of overloading [`Reply::operator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub variable: String,
    pub operator: Operator,
    pub value: String,
    /// Human-readable volume level, populated only for `Volume` replies.
    pub volume: Option<String>,
}

/// Input source selectable on the amplifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    CD,
    Tuner,
    Video,
    Disc,
    Ipod,
    Tape2,
    Aux,
}

impl Source {
    /// The wire name of this source.
    pub fn as_str(self) -> &'static str {
        match self {
            Source::CD => "CD",
            Source::Tuner => "Tuner",
            Source::Video => "Video",
            Source::Disc => "Disc",
            Source::Ipod => "Ipod",
            Source::Tape2 => "Tape2",
            Source::Aux => "Aux",
        }
    }
}

impl FromStr for Source {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CD" => Ok(Source::CD),
            "Tuner" => Ok(Source::Tuner),
            "Video" => Ok(Source::Video),
            "Disc" => Ok(Source::Disc),
            "Ipod" => Ok(Source::Ipod),
            "Tape2" => Ok(Source::Tape2),
            "Aux" => Ok(Source::Aux),
            other => Err(ProtocolError::UnknownSource(other.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
