//! Terminal dialogs: operation confirmation, key entry and retry

use async_trait::async_trait;
use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use geogenie_core::error::{GeogenieError, Result, ValidationError};
use geogenie_core::models::Provider;
use geogenie_intent::{Confirmer, Decision, ValidatedOperation};
use indicatif::ProgressBar;
use serde_json::Value;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table};

use crate::output_types::ParameterRow;

fn dialog_error(error: dialoguer::Error) -> GeogenieError {
    match error {
        dialoguer::Error::IO(e) => GeogenieError::Io(e),
    }
}

/// Run a blocking dialog off the async runtime
async fn blocking<T, F>(dialog: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(dialog)
        .await
        .map_err(|e| GeogenieError::Io(std::io::Error::other(e)))?
}

/// Confirmation dialog on the terminal: approve, edit a parameter, or cancel
#[derive(Clone, Default)]
pub struct DialoguerConfirmer {
    waiting: Option<ProgressBar>,
}

impl DialoguerConfirmer {
    /// Confirmer that clears `spinner` before drawing the dialog
    pub fn clearing(spinner: ProgressBar) -> Self {
        Self { waiting: Some(spinner) }
    }
}

#[async_trait]
impl Confirmer for DialoguerConfirmer {
    async fn confirm(&self, op: &ValidatedOperation, rejected: Option<&ValidationError>) -> Result<Decision> {
        if let Some(spinner) = &self.waiting {
            spinner.finish_and_clear();
        }
        let op = op.clone();
        let rejected = rejected.cloned();
        blocking(move || confirm_dialog(&op, rejected.as_ref())).await
    }
}

fn confirm_dialog(op: &ValidatedOperation, rejected: Option<&ValidationError>) -> Result<Decision> {
    eprintln!("\n{} {}", style("Planned operation:").bold(), style(op.op()).cyan().bold());

    let rows: Vec<ParameterRow> = op
        .summary()
        .into_iter()
        .map(|(name, value)| ParameterRow { name: name.to_string(), value })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    eprintln!("{}", table);
    eprintln!("Output layer: {}", style(op.target_layer_name()).bold());

    for caveat in op.caveats() {
        if caveat.requires_attention() {
            eprintln!("{} {}", style("⚠").yellow().bold(), caveat);
        } else {
            eprintln!("{} {}", style("ℹ").blue(), caveat);
        }
    }

    if let Some(error) = rejected {
        eprintln!("{} Edit rejected: {}", style("✗").red().bold(), error);
    }
    eprintln!();

    let choice = Select::new()
        .with_prompt("Run this operation?")
        .items(&["Run", "Edit a parameter", "Cancel"])
        .default(0)
        .interact()
        .map_err(dialog_error)?;

    match choice {
        0 => Ok(Decision::Approve),
        1 => edit_dialog(op),
        _ => Ok(Decision::Cancel),
    }
}

fn edit_dialog(op: &ValidatedOperation) -> Result<Decision> {
    let names: Vec<&str> = op.spec().parameters.iter().map(|p| p.name).collect();
    let labels: Vec<String> = op
        .spec()
        .parameters
        .iter()
        .map(|p| match op.param(p.name) {
            Some(value) => format!("{} = {}", p.name, value),
            None => format!("{} (not set)", p.name),
        })
        .collect();

    let idx = Select::new()
        .with_prompt("Parameter")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(dialog_error)?;

    let text: String = Input::new()
        .with_prompt(format!("New value for {} (empty removes it)", names[idx]))
        .allow_empty(true)
        .interact_text()
        .map_err(dialog_error)?;

    Ok(Decision::Edit(BTreeMap::from([(names[idx].to_string(), parse_edit(&text))])))
}

/// Numbers and booleans as JSON, anything else as text; empty clears the parameter
pub fn parse_edit(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(text.to_string()),
    }
}

/// Ask for an API key without echoing it
pub async fn prompt_api_key(provider: Provider) -> Result<String> {
    blocking(move || {
        Password::new()
            .with_prompt(format!("API key for {}", provider))
            .interact()
            .map_err(dialog_error)
    })
    .await
}

/// Offer to send the request again after a transport failure
pub async fn confirm_retry(error: &GeogenieError) -> Result<bool> {
    let message = error.to_string();
    blocking(move || {
        eprintln!("{} {}", style("✗").red().bold(), message);
        Confirm::new()
            .with_prompt("Try again?")
            .default(true)
            .interact()
            .map_err(dialog_error)
    })
    .await
}
