//! Operator confirmation on the terminal.

use async_trait::async_trait;
use std::io::{self, BufRead, Write};

use contract_sync_core::errors::{Error, Result};
use contract_sync_core::listings::{ConfirmEdits, ListingPlan};

/// Shows the plan on stdout and reads a yes/no answer from stdin.
pub struct StdinConfirm {
    preview_limit: usize,
}

impl StdinConfirm {
    pub fn new(preview_limit: usize) -> Self {
        Self { preview_limit }
    }
}

#[async_trait]
impl ConfirmEdits for StdinConfirm {
    async fn confirm(&self, plan: &ListingPlan) -> Result<bool> {
        let text = plan.describe(self.preview_limit);
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stdout = io::stdout();
            writeln!(stdout, "{}", text)?;
            write!(stdout, "Apply these changes? [y/N] ")?;
            stdout.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(|e| Error::Unexpected(format!("confirmation prompt failed: {}", e)))?
        .map_err(|e| Error::Unexpected(format!("failed to read confirmation: {}", e)))?;
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
