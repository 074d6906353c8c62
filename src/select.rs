// Selection layer: renders a numbered table of records and reads a validated
// choice. Every endpoint funnels its list-and-select flow through here, and
// the menu driver uses the same prompt for its own option lists.

use chrono::Local;
use dialoguer::{Confirm, Input};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use tracing::debug;

use crate::error::{CliError, Result};
use crate::format::value_to_string;
use crate::output::new_table;

/// Transient `{id, name}` pair used to render a fixed choice list.
#[derive(Debug, Clone, Serialize)]
pub struct MenuOption {
    pub id: String,
    pub name: String,
}

impl MenuOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Numbered list options `1..=n` for plain string labels.
pub fn numbered(labels: &[&str]) -> Vec<MenuOption> {
    labels
        .iter()
        .enumerate()
        .map(|(i, name)| MenuOption::new((i + 1).to_string(), *name))
        .collect()
}

/// What the operator picked.
///
/// `options` is positionally aligned with the printed numbers: with the
/// "None" entry enabled it starts with the `["", "None"]` sentinel so `raw`
/// indexes it directly, otherwise index `raw - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuChoice {
    pub raw: String,
    pub options: Vec<[String; 2]>,
    pub none_option: bool,
}

impl MenuChoice {
    /// Position of the chosen entry in `options`.
    pub fn index(&self) -> usize {
        let n: usize = self.raw.trim().parse().unwrap_or(0);
        if self.none_option {
            n
        } else {
            n.saturating_sub(1)
        }
    }

    /// `(identifier, display)` of the chosen record; `None` for the sentinel.
    pub fn selected(&self) -> Option<(&str, &str)> {
        let [id, desc] = self.options.get(self.index())?;
        if self.none_option && self.index() == 0 {
            return None;
        }
        Some((id.as_str(), desc.as_str()))
    }
}

/// Numbered selection prompt over a list of records.
#[derive(Debug, Clone)]
pub struct SelectMenu<'a> {
    prompt: &'a str,
    value_key: &'a str,
    display_keys: &'a [&'a str],
    none_option: bool,
    show_timestamp: bool,
}

impl<'a> SelectMenu<'a> {
    pub fn new(prompt: &'a str, value_key: &'a str, display_keys: &'a [&'a str]) -> Self {
        Self {
            prompt,
            value_key,
            display_keys,
            none_option: false,
            show_timestamp: false,
        }
    }

    /// Offer `0. None` as a valid answer.
    pub fn none_option(mut self, enabled: bool) -> Self {
        self.none_option = enabled;
        self
    }

    /// Print the current local time under the table.
    pub fn show_timestamp(mut self, enabled: bool) -> Self {
        self.show_timestamp = enabled;
        self
    }

    /// Run against the terminal. Closing standard input ends the process.
    pub fn run<T: Serialize>(&self, records: &[T]) -> Result<Option<MenuChoice>> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        match self.run_with(records, &mut stdin.lock(), &mut stdout.lock()) {
            Err(CliError::Interrupted) => {
                println!();
                std::process::exit(130);
            }
            other => other,
        }
    }

    /// Run against arbitrary input and output.
    ///
    /// Returns `Ok(None)` when there is nothing to choose from.
    pub fn run_with<T, R, W>(&self, records: &[T], input: &mut R, out: &mut W) -> Result<Option<MenuChoice>>
    where
        T: Serialize,
        R: BufRead,
        W: Write,
    {
        let records = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()
            .map_err(|e| CliError::decode("menu record", e))?;

        if records.is_empty() && !self.none_option {
            writeln!(out, "Nothing to select.")?;
            return Ok(None);
        }

        let mut options = Vec::with_capacity(records.len() + 1);
        if self.none_option {
            options.push([String::new(), "None".to_string()]);
        }
        let primary = self.display_keys.first().copied().unwrap_or(self.value_key);
        for record in &records {
            options.push([self.field(record, self.value_key), self.field(record, primary)]);
        }

        let base = if self.none_option { 0 } else { 1 };
        let last = base + options.len() - 1;

        loop {
            self.render(&records, out)?;
            write!(out, "{}", self.prompt)?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(CliError::Interrupted);
            }
            let raw = line.trim().to_string();
            match raw.parse::<usize>() {
                Ok(n) if (base..=last).contains(&n) => {
                    debug!(prompt = self.prompt, choice = n, "menu choice");
                    return Ok(Some(MenuChoice {
                        raw,
                        options,
                        none_option: self.none_option,
                    }));
                }
                Ok(_) => writeln!(out, "{} is not between {} and {}", raw, base, last)?,
                Err(_) => writeln!(out, "{} is not a number", raw)?,
            }
        }
    }

    fn render<W: Write>(&self, records: &[Value], out: &mut W) -> Result<()> {
        let mut table = new_table();
        let mut header = vec!["#".to_string()];
        header.extend(self.display_keys.iter().map(|k| k.to_string()));
        table.set_header(header);

        if self.none_option {
            let mut row = vec!["0".to_string(), "None".to_string()];
            row.resize(self.display_keys.len().max(1) + 1, String::new());
            table.add_row(row);
        }
        for (i, record) in records.iter().enumerate() {
            let mut row = vec![(i + 1).to_string()];
            row.extend(self.display_keys.iter().map(|k| self.field(record, k)));
            table.add_row(row);
        }

        writeln!(out, "{}", table)?;
        if self.show_timestamp {
            writeln!(out, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        }
        Ok(())
    }

    fn field(&self, record: &Value, key: &str) -> String {
        record.get(key).map(value_to_string).unwrap_or_default()
    }
}

/// Free-text prompt; an empty answer is allowed.
pub fn text_prompt(prompt: &str) -> Result<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(answer.trim().to_string())
}

/// Yes/no prompt defaulting to "no".
pub fn yes_no(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}
