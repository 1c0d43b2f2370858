//! Tab-separated tables as distributed to participants.
//!
//! No quoting: every tab separates a field and every line break ends a row.
//! A cell holding only `-`, or nothing, is null.

use anyhow::{Context, bail};

const NULL_MARKER: &str = "-";

#[derive(Debug)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [Option<String>],
}

impl Table {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut lines = content
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line));

        let header = lines.next().context("Missing header line")?;
        let columns: Vec<String> = header.split('\t').map(|c| c.trim().to_string()).collect();

        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<Option<String>> = line.split('\t').map(cell).collect();
            if cells.len() != columns.len() {
                bail!(
                    "Line {} has {} fields, the header has {}",
                    i + 2,
                    cells.len(),
                    columns.len()
                );
            }
            rows.push(cells);
        }

        Ok(Self { columns, rows })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn require_columns(&self, names: &[&str]) -> anyhow::Result<()> {
        for name in names {
            if !self.has_column(name) {
                bail!("Missing column `{name}`");
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row { table: self, cells })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

impl Row<'_> {
    /// The cell under `column`, `None` when null or when the column is absent.
    pub fn get(&self, column: &str) -> Option<String> {
        let index = self.table.columns.iter().position(|c| c == column)?;
        self.cells.get(index).cloned().flatten()
    }
}

fn cell(raw: &str) -> Option<String> {
    match raw {
        "" | NULL_MARKER => None,
        value => Some(value.to_string()),
    }
}
