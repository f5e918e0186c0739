//! Interactive shell.
//!
//! Reads statements line by line, dispatches them to the executor, and
//! prints results to stdout. Statement failures are reported on stderr
//! and do not end the session; QUIT or end-of-input does.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::config::Config;
use crate::executor::{self, SelectResult};
use crate::parser::{self, Command};
use crate::types::SelectTarget;

pub struct Shell {
    config: Config,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Shell { config }
    }

    pub fn run(&self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline("acorn> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);
                    if !self.dispatch(trimmed) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Run one statement; returns false when the session should end.
    fn dispatch(&self, line: &str) -> bool {
        match parser::parse(line) {
            Ok(Command::Quit) => return false,
            Ok(Command::Select {
                target,
                table,
                conds,
            }) => match executor::select(&self.config.data_dir, target, &table, &conds) {
                Ok(result) => print_result(target, &result),
                Err(e) => eprintln!("Error: {e}"),
            },
            Ok(Command::Load {
                table,
                file,
                with_index,
            }) => match executor::load(&self.config.data_dir, &table, &file, with_index) {
                Ok(n) => println!("{n} tuple{} loaded", if n == 1 { "" } else { "s" }),
                Err(e) => eprintln!("Error: {e}"),
            },
            Err(e) => eprintln!("Error: {e}"),
        }
        true
    }
}

fn print_result(target: SelectTarget, result: &SelectResult) {
    match target {
        SelectTarget::Count => println!("{}", result.count),
        SelectTarget::Key => {
            for row in &result.rows {
                println!("{}", row.key);
            }
        }
        SelectTarget::Value => {
            for row in &result.rows {
                println!("{}", row.value);
            }
        }
        SelectTarget::All => {
            for row in &result.rows {
                println!("{} '{}'", row.key, row.value);
            }
        }
    }
}
