//! # View Module
//!
//! [`ViewState`] is the locally held snapshot the render path reads. Only
//! the synchronizer and the app write it; values are always those of the
//! last completed fetch, never computed locally.

use std::collections::BTreeMap;

use crate::{errors::Operation, state::Balance, wallet::Session};

const TITLE: &str = "Counter DApp";
const LOADING: &str = "Loading...";
const CONNECTED_PROMPT: &str = "[+ n] increase  [- n] decrease  [r] refresh  [d] disconnect  [q] quit";
const DISCONNECTED_PROMPT: &str = "[c] connect  [q] quit";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// `None` until the balance query completes
    pub balance: Option<Balance>,
    /// `None` until the counter query completes
    pub counter: Option<u64>,
    /// Last failure of each operation, cleared when it next succeeds
    pub errors: BTreeMap<Operation, String>,
}

impl ViewState {
    pub fn record_error(&mut self, operation: Operation, message: impl Into<String>) {
        self.errors.insert(operation, message.into());
    }

    pub fn clear_error(&mut self, operation: Operation) {
        self.errors.remove(&operation);
    }

    pub fn error(&self, operation: Operation) -> Option<&str> {
        self.errors.get(&operation).map(String::as_str)
    }

    /// Text rendering of the view for `session`
    pub fn render(&self, session: Option<&Session>) -> String {
        let mut lines = vec![TITLE.to_string()];

        match session.filter(|session| session.connected) {
            Some(session) => {
                let balance = self.balance.map(|balance| balance.to_string());
                let counter = self.counter.map(|counter| counter.to_string());
                lines.push(format!("Wallet Address: {}", session.public_key));
                lines.push(format!("SOL Balance: {}", balance.as_deref().unwrap_or(LOADING)));
                lines.push(format!("Counter Value: {}", counter.as_deref().unwrap_or(LOADING)));
                lines.extend(self.error_lines());
                lines.push(CONNECTED_PROMPT.to_string());
            }
            None => {
                lines.extend(self.error_lines());
                lines.push("Please connect your wallet to continue.".to_string());
                lines.push(DISCONNECTED_PROMPT.to_string());
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn error_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.errors
            .iter()
            .map(|(operation, message)| format!("! {operation} failed: {message}"))
    }
}
