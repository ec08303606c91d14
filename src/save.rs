use crate::board::{BOARD_SIZE, Board, PIECES_PER_SIDE, Player, Position, Rank};
use crate::config::GameConfig;
use crate::error::StoreError;
use crate::game::{GameState, Scores};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNames {
    pub black: String,
    pub white: String,
}

impl PlayerNames {
    pub fn new(black: impl Into<String>, white: impl Into<String>) -> Self {
        let mut names = PlayerNames {
            black: black.into(),
            white: white.into(),
        };
        names.fill_defaults();
        names
    }

    pub fn get(&self, player: Player) -> &str {
        match player {
            Player::Black => &self.black,
            Player::White => &self.white,
        }
    }

    fn fill_defaults(&mut self) {
        if self.black.trim().is_empty() {
            self.black = Player::Black.name().to_string();
        }
        if self.white.trim().is_empty() {
            self.white = Player::White.name().to_string();
        }
    }
}

impl Default for PlayerNames {
    fn default() -> Self {
        PlayerNames::new(Player::Black.name(), Player::White.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPiece {
    pub player: Player,
    pub is_king: bool,
}

/// Board as an 8x8 grid, `None` for every empty or light square.
pub type BoardShape = Vec<Vec<Option<SavedPiece>>>;

pub fn board_shape(board: &Board) -> BoardShape {
    (0..BOARD_SIZE)
        .map(|row| {
            (0..BOARD_SIZE)
                .map(|col| {
                    board.get(Position::new(row, col)).map(|piece| SavedPiece {
                        player: piece.owner,
                        is_king: piece.is_king(),
                    })
                })
                .collect()
        })
        .collect()
}

/// The autosave record, in the camelCase shape the browser client reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub board: BoardShape,
    pub current_player: Player,
    #[serde(default)]
    pub black_score: u32,
    #[serde(default)]
    pub white_score: u32,
    #[serde(default)]
    pub moves_since_pawn_or_capture: u32,
    #[serde(default)]
    pub remaining_time: u64,
    #[serde(default)]
    pub player_black_name: String,
    #[serde(default)]
    pub player_white_name: String,
}

/// A saved game turned back into live state.
#[derive(Debug, Clone)]
pub struct Restored {
    pub state: GameState,
    pub names: PlayerNames,
    pub remaining_time: u64,
}

impl SavedGame {
    pub fn from_state(state: &GameState, names: &PlayerNames, remaining_time: u64) -> Self {
        let scores = state.scores();
        SavedGame {
            board: board_shape(state.board()),
            current_player: state.current_player(),
            black_score: scores.black,
            white_score: scores.white,
            moves_since_pawn_or_capture: state.moves_since_progress(),
            remaining_time,
            player_black_name: names.black.clone(),
            player_white_name: names.white.clone(),
        }
    }

    fn rebuild_board(&self) -> Result<Board, StoreError> {
        if self.board.len() != BOARD_SIZE {
            return Err(StoreError::Corrupt(format!(
                "board has {} rows, expected {}",
                self.board.len(),
                BOARD_SIZE
            )));
        }

        let mut board = Board::empty();
        for (row, cells) in self.board.iter().enumerate() {
            if cells.len() != BOARD_SIZE {
                return Err(StoreError::Corrupt(format!(
                    "row {} has {} cells, expected {}",
                    row,
                    cells.len(),
                    BOARD_SIZE
                )));
            }
            for (col, cell) in cells.iter().enumerate() {
                let Some(saved) = cell else { continue };
                let pos = Position::new(row, col);
                if !pos.is_playable() {
                    return Err(StoreError::Corrupt(format!("piece on light square {}", pos)));
                }
                let rank = if saved.is_king { Rank::King } else { Rank::Man };
                board.place(pos, saved.player, rank);
            }
        }

        let material = board.material();
        for player in [Player::Black, Player::White] {
            let count = material.side(player).total();
            if count > PIECES_PER_SIDE {
                return Err(StoreError::Corrupt(format!(
                    "{} has {} pieces, at most {} allowed",
                    player, count, PIECES_PER_SIDE
                )));
            }
        }

        Ok(board)
    }

    /// Rebuild the live game. Anything structurally impossible is `Corrupt`.
    pub fn restore(&self, config: &GameConfig) -> Result<Restored, StoreError> {
        let board = self.rebuild_board()?;

        if self.moves_since_pawn_or_capture > config.no_progress_limit {
            return Err(StoreError::Corrupt(format!(
                "no-progress counter {} exceeds {}",
                self.moves_since_pawn_or_capture, config.no_progress_limit
            )));
        }

        let scores = Scores {
            black: self.black_score,
            white: self.white_score,
        };
        let mut state = GameState::from_parts(
            board,
            self.current_player,
            scores,
            self.moves_since_pawn_or_capture,
        );
        state.set_no_progress_limit(config.no_progress_limit);

        let remaining_time = if self.remaining_time == 0 {
            config.time_per_turn.as_secs()
        } else {
            self.remaining_time
        };

        Ok(Restored {
            state,
            names: PlayerNames::new(
                self.player_black_name.clone(),
                self.player_white_name.clone(),
            ),
            remaining_time,
        })
    }
}
