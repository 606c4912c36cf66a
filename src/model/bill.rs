// File: ./src/model/bill.rs
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_uid() -> String {
    Uuid::new_v4().to_string()
}

/// A monthly payment due on a fixed day of the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillDefinition {
    #[serde(default = "default_uid")]
    pub id: String,
    pub name: String,
    /// Day of month, 1..=31. Months without this day have no occurrence.
    pub due_date: u32,
    #[serde(default)]
    pub amount: Option<f64>,
}

impl BillDefinition {
    pub fn new(name: &str, due_date: u32) -> Self {
        Self {
            id: default_uid(),
            name: name.to_string(),
            due_date,
            amount: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=31).contains(&self.due_date) {
            bail!(
                "Bill '{}' has due day {} outside 1..=31",
                self.id,
                self.due_date
            );
        }
        Ok(())
    }
}
