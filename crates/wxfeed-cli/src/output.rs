use crate::{Cli, OutputFormat};
use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

pub trait OutputDisplay {
    fn display(&self, cli: &Cli) -> anyhow::Result<()>;
}

impl<T> OutputDisplay for Vec<T>
where
    T: Tabled + Serialize,
{
    fn display(&self, cli: &Cli) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Table => {
                if self.is_empty() {
                    println!("{}", "No samples".yellow());
                } else {
                    println!("{}", Table::new(self));
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self)?);
            }
        }
        Ok(())
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}
