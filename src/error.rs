use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Could not resolve a legal commander named \"{0}\"")]
    Resolution(String),
    #[error("No legal random commander found after {attempts} attempts")]
    NoCommanderFound { attempts: usize },
    #[error("Budget of {budget:.2}€ is already exceeded by the commanders ({commanders:.2}€)")]
    BudgetExceeded { budget: f64, commanders: f64 },
    #[error("Card data source returned HTTP {status}")]
    DataSource { status: u16 },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Generation superseded by a newer request")]
    Superseded,
}

impl DeckError {
    /// True for a data source "no such card" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeckError::DataSource { status: 404 })
    }
}

pub type DeckResult<T> = Result<T, DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_message_shows_both_amounts() {
        let err = DeckError::BudgetExceeded {
            budget: 10.0,
            commanders: 12.5,
        };
        assert_eq!(
            err.to_string(),
            "Budget of 10.00€ is already exceeded by the commanders (12.50€)"
        );
    }

    #[test]
    fn only_404_counts_as_not_found() {
        assert!(DeckError::DataSource { status: 404 }.is_not_found());
        assert!(!DeckError::DataSource { status: 500 }.is_not_found());
        assert!(!DeckError::Superseded.is_not_found());
    }
}
