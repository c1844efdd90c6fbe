//! Events the interactive loop reacts to, parsed from input lines.

use std::str::FromStr;

use crate::{
    dispatch::{Command, DEFAULT_STEP},
    errors::DappError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Connect,
    Disconnect,
    Refresh,
    Command(Command),
    Quit,
}

impl FromStr for UiEvent {
    type Err = DappError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(DappError::InvalidInput("empty input".to_string()));
        };
        let step = match tokens.next() {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| DappError::InvalidInput(format!("invalid step `{raw}`")))?,
            None => DEFAULT_STEP,
        };
        if let Some(extra) = tokens.next() {
            return Err(DappError::InvalidInput(format!("unexpected `{extra}`")));
        }

        let event = match head.to_ascii_lowercase().as_str() {
            "+" | "inc" | "increment" => UiEvent::Command(Command::Increment(step)),
            "-" | "dec" | "decrement" => UiEvent::Command(Command::Decrement(step)),
            "c" | "connect" => UiEvent::Connect,
            "d" | "disconnect" => UiEvent::Disconnect,
            "r" | "refresh" => UiEvent::Refresh,
            "q" | "quit" | "exit" => UiEvent::Quit,
            other => return Err(DappError::InvalidInput(format!("unknown command `{other}`"))),
        };
        Ok(event)
    }
}
