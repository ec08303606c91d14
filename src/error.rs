use thiserror::Error;

/// Rejections raised by the turn state machine. None of them changes the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("That piece is not yours")]
    NotYourPiece,
    #[error("No piece on that square")]
    EmptySquare,
    #[error("Capture is mandatory: select a piece that can take")]
    MustCapture,
    #[error("No piece selected")]
    NoSelection,
    #[error("Invalid destination")]
    InvalidDestination,
    #[error("The capturing piece must keep jumping")]
    ChainInProgress,
    #[error("Game already over")]
    GameOver,
    #[error("Game is paused")]
    GamePaused,
    #[error("No game in progress")]
    NoActiveGame,
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl GameError {
    /// Stable code for the presentation layer.
    pub fn reason_code(&self) -> &'static str {
        match self {
            GameError::NotYourPiece => "not_your_piece",
            GameError::EmptySquare => "empty_square",
            GameError::MustCapture => "must_capture",
            GameError::NoSelection => "no_selection",
            GameError::InvalidDestination => "invalid_destination",
            GameError::ChainInProgress => "chain_in_progress",
            GameError::GameOver => "game_over",
            GameError::GamePaused => "game_paused",
            GameError::NoActiveGame => "no_active_game",
            GameError::InternalInconsistency(_) => "internal_inconsistency",
        }
    }

    /// True for the rejections that stem from a bad piece selection.
    pub fn is_invalid_selection(&self) -> bool {
        matches!(
            self,
            GameError::NotYourPiece | GameError::EmptySquare | GameError::MustCapture
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Corrupt saved state: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_distinct() {
        let errors = [
            GameError::NotYourPiece,
            GameError::EmptySquare,
            GameError::MustCapture,
            GameError::NoSelection,
            GameError::InvalidDestination,
            GameError::ChainInProgress,
            GameError::GameOver,
            GameError::GamePaused,
            GameError::NoActiveGame,
            GameError::InternalInconsistency(String::new()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(GameError::reason_code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_selection_taxonomy() {
        assert!(GameError::MustCapture.is_invalid_selection());
        assert!(GameError::NotYourPiece.is_invalid_selection());
        assert!(!GameError::InvalidDestination.is_invalid_selection());
    }
}
