use crate::board::{Board, Piece, PieceId, Player, Position, Rank};
use crate::config::{GameConfig, NO_PROGRESS_LIMIT};
use crate::error::GameError;
use crate::movegen::{self, Move, MoveFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    NoPiecesLeft,
    Blocked,
    Resigned,
    TimeExpired,
}

impl WinReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WinReason::NoPiecesLeft => "no pieces left",
            WinReason::Blocked => "blocked, no legal move",
            WinReason::Resigned => "resigned",
            WinReason::TimeExpired => "time expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    NoProgress,
    OneKingEach,
    TwoKingsVsOne,
}

impl DrawReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawReason::NoProgress => "50-half-move rule",
            DrawReason::OneKingEach => "1 king vs 1 king",
            DrawReason::TwoKingsVsOne => "2 kings vs 1 king",
        }
    }
}

/// Final verdict of a game. Once set on a `GameState` it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Outcome {
    Win { winner: Player, reason: WinReason },
    Draw { reason: DrawReason },
}

impl Outcome {
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Win { winner, .. } => Some(*winner),
            Outcome::Draw { .. } => None,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Outcome::Win { reason, .. } => reason.as_str(),
            Outcome::Draw { reason } => reason.as_str(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win { winner, reason } => write!(f, "{} wins ({})", winner, reason.as_str()),
            Outcome::Draw { reason } => write!(f, "draw ({})", reason.as_str()),
        }
    }
}

/// Endings triggered from outside the rules: a player gives up or runs out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedEnd {
    Resigned,
    TimeExpired,
}

/// Captured opponent pieces per player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub black: u32,
    pub white: u32,
}

impl Scores {
    pub fn get(&self, player: Player) -> u32 {
        match player {
            Player::Black => self.black,
            Player::White => self.white,
        }
    }

    fn credit(&mut self, player: Player) {
        match player {
            Player::Black => self.black += 1,
            Player::White => self.white += 1,
        }
    }
}

/// The piece the active player is moving and the moves offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub piece: PieceId,
    pub from: Position,
    pub moves: Vec<Move>,
    /// Set after a capture that left a further capture open to the same piece.
    pub chained: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingSelection,
    PieceSelected,
    Chained,
    Finished,
}

/// What happened when a move was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub played: Move,
    pub captured: Option<Piece>,
    pub promoted: bool,
    /// The same piece must capture again; the turn has not passed.
    pub continuation: bool,
    pub outcome: Option<Outcome>,
}

/// End-of-game checks for `player` about to move, in rule order.
pub fn evaluate(
    board: &Board,
    player: Player,
    moves_since_progress: u32,
    no_progress_limit: u32,
) -> Option<Outcome> {
    if moves_since_progress >= no_progress_limit {
        return Some(Outcome::Draw {
            reason: DrawReason::NoProgress,
        });
    }

    let material = board.material();
    if material.black.men == 0 && material.white.men == 0 {
        match (material.black.kings, material.white.kings) {
            (1, 1) => {
                return Some(Outcome::Draw {
                    reason: DrawReason::OneKingEach,
                });
            }
            (2, 1) | (1, 2) => {
                return Some(Outcome::Draw {
                    reason: DrawReason::TwoKingsVsOne,
                });
            }
            _ => {}
        }
    }

    let winner = player.opponent();
    if material.side(player).total() == 0 {
        return Some(Outcome::Win {
            winner,
            reason: WinReason::NoPiecesLeft,
        });
    }

    if movegen::legal_moves(board, player).is_empty() {
        return Some(Outcome::Win {
            winner,
            reason: WinReason::Blocked,
        });
    }

    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    current_player: Player,
    capture_mandatory: bool,
    moves_since_progress: u32,
    scores: Scores,
    turn: u64,
    selection: Option<Selection>,
    outcome: Option<Outcome>,
    no_progress_limit: u32,
}

impl GameState {
    /// A fresh game in the standard layout, Black to move.
    pub fn new() -> Self {
        Self::with_config(&GameConfig::default())
    }

    pub fn with_config(config: &GameConfig) -> Self {
        let mut state = Self::from_parts(Board::standard(), Player::Black, Scores::default(), 0);
        state.no_progress_limit = config.no_progress_limit;
        state
    }

    /// Rebuild a game from a position. The mandatory-capture flag is re-derived;
    /// no end-of-game check is run until the next turn switch.
    pub fn from_parts(
        board: Board,
        current_player: Player,
        scores: Scores,
        moves_since_progress: u32,
    ) -> Self {
        let capture_mandatory = movegen::has_mandatory_capture(&board, current_player);
        GameState {
            board,
            current_player,
            capture_mandatory,
            moves_since_progress,
            scores,
            turn: 0,
            selection: None,
            outcome: None,
            no_progress_limit: NO_PROGRESS_LIMIT,
        }
    }

    pub(crate) fn set_no_progress_limit(&mut self, limit: u32) {
        self.no_progress_limit = limit;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn capture_mandatory(&self) -> bool {
        self.capture_mandatory
    }

    pub fn moves_since_progress(&self) -> u32 {
        self.moves_since_progress
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Counts completed turn switches; clock expiries are tagged with it.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn phase(&self) -> TurnPhase {
        match (&self.outcome, &self.selection) {
            (Some(_), _) => TurnPhase::Finished,
            (None, None) => TurnPhase::AwaitingSelection,
            (None, Some(sel)) if sel.chained => TurnPhase::Chained,
            (None, Some(_)) => TurnPhase::PieceSelected,
        }
    }

    /// Pieces the active player is forced to pick from, empty when capture is optional.
    pub fn capturing_pieces(&self) -> Vec<Position> {
        if self.capture_mandatory && !self.is_game_over() {
            movegen::pieces_with_capture(&self.board, self.current_player)
        } else {
            Vec::new()
        }
    }

    /// All moves the active player may play right now.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_game_over() {
            return Vec::new();
        }
        match &self.selection {
            Some(sel) if sel.chained => sel.moves.clone(),
            _ => movegen::legal_moves(&self.board, self.current_player),
        }
    }

    /// Run the end-of-game checks against the current position.
    pub fn evaluate(&self) -> Option<Outcome> {
        evaluate(
            &self.board,
            self.current_player,
            self.moves_since_progress,
            self.no_progress_limit,
        )
    }

    /// Pick up the piece on `pos` and return the moves offered for it.
    pub fn select_piece(&mut self, pos: Position) -> Result<Vec<Move>, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }

        if let Some(sel) = &self.selection {
            if sel.chained {
                return if sel.from == pos {
                    Ok(sel.moves.clone())
                } else {
                    Err(GameError::ChainInProgress)
                };
            }
        }

        let piece = self.board.get(pos).ok_or(GameError::EmptySquare)?;
        if piece.owner != self.current_player {
            return Err(GameError::NotYourPiece);
        }

        let moves = movegen::generate_moves(&self.board, pos, MoveFilter::PreferCaptures);
        if self.capture_mandatory && !moves.iter().any(Move::is_capture) {
            return Err(GameError::MustCapture);
        }

        debug!(player = %self.current_player, %pos, count = moves.len(), "piece selected");
        self.selection = Some(Selection {
            piece: piece.id,
            from: pos,
            moves: moves.clone(),
            chained: false,
        });
        Ok(moves)
    }

    /// Drop the current selection. Not allowed while a capture chain is pending.
    pub fn deselect(&mut self) -> Result<(), GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        match &self.selection {
            Some(sel) if sel.chained => Err(GameError::ChainInProgress),
            _ => {
                self.selection = None;
                Ok(())
            }
        }
    }

    /// Play the offered move landing on `to`.
    pub fn choose_destination(&mut self, to: Position) -> Result<MoveReport, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let sel = self.selection.as_ref().ok_or(GameError::NoSelection)?;
        let mv = sel
            .moves
            .iter()
            .copied()
            .find(|m| m.to == to)
            .ok_or(GameError::InvalidDestination)?;
        self.apply_move(mv)
    }

    /// Play one of the moves offered for the selected piece.
    pub fn choose_move(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let sel = self.selection.as_ref().ok_or(GameError::NoSelection)?;
        if !sel.moves.contains(&mv) {
            return Err(GameError::InvalidDestination);
        }
        self.apply_move(mv)
    }

    /// Select `mv.from` (unless already chained on it) and play `mv`.
    pub fn play(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        let already_selected = self
            .selection
            .as_ref()
            .is_some_and(|sel| sel.from == mv.from);
        if !already_selected {
            self.select_piece(mv.from)?;
        }
        self.choose_move(mv)
    }

    /// Check the move against the board before anything is touched.
    fn verify(&self, sel: &Selection, mv: Move) -> Result<Piece, String> {
        let piece = self
            .board
            .get(mv.from)
            .ok_or_else(|| format!("no piece on {} for move {}", mv.from, mv))?;
        if piece.id != sel.piece || mv.from != sel.from {
            return Err(format!("move {} does not belong to the selected piece", mv));
        }
        if piece.owner != self.current_player {
            return Err(format!("piece on {} is not {}'s", mv.from, self.current_player));
        }
        if !mv.to.is_playable() || !self.board.is_empty(mv.to) {
            return Err(format!("destination {} is not a free dark square", mv.to));
        }
        if let Some(jumped) = mv.jumped() {
            match self.board.get(jumped) {
                Some(victim) if victim.owner != piece.owner => {}
                _ => return Err(format!("no opposing piece to take on {}", jumped)),
            }
        }
        Ok(piece)
    }

    fn apply_move(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        let Some(sel) = self.selection.as_ref() else {
            return Err(GameError::NoSelection);
        };
        let piece = match self.verify(sel, mv) {
            Ok(piece) => piece,
            Err(msg) => {
                error!(%mv, reason = %msg, "aborting move, state left untouched");
                return Err(GameError::InternalInconsistency(msg));
            }
        };

        let was_man = piece.rank == Rank::Man;
        self.board.relocate(mv.from, mv.to);

        let mut captured = None;
        if let Some(jumped) = mv.jumped() {
            captured = self.board.remove(jumped);
            self.scores.credit(piece.owner);

            let next = movegen::capture_moves(&self.board, mv.to);
            if !next.is_empty() {
                debug!(player = %piece.owner, at = %mv.to, count = next.len(), "capture chain continues");
                self.moves_since_progress = 0;
                self.capture_mandatory = true;
                self.selection = Some(Selection {
                    piece: piece.id,
                    from: mv.to,
                    moves: next,
                    chained: true,
                });
                return Ok(MoveReport {
                    played: mv,
                    captured,
                    promoted: false,
                    continuation: true,
                    outcome: None,
                });
            }
        }

        let promoted =
            was_man && mv.to.row == piece.owner.promotion_row() && self.board.promote(mv.to);
        if promoted {
            info!(player = %piece.owner, at = %mv.to, "man crowned");
        }

        if captured.is_some() || was_man {
            self.moves_since_progress = 0;
        } else {
            self.moves_since_progress += 1;
        }

        let outcome = self.switch_player();

        Ok(MoveReport {
            played: mv,
            captured,
            promoted,
            continuation: false,
            outcome,
        })
    }

    /// Hand the turn to the opponent and settle the game if it has ended.
    fn switch_player(&mut self) -> Option<Outcome> {
        self.selection = None;
        self.current_player = self.current_player.opponent();
        self.turn += 1;
        self.capture_mandatory = movegen::has_mandatory_capture(&self.board, self.current_player);
        debug!(
            player = %self.current_player,
            turn = self.turn,
            capture_mandatory = self.capture_mandatory,
            counter = self.moves_since_progress,
            "turn switched"
        );

        self.outcome = self.evaluate();
        if let Some(outcome) = &self.outcome {
            info!(%outcome, "game over");
        }
        self.outcome
    }

    /// Clock expiry for the turn numbered `turn`: pass the move to the opponent.
    /// Returns false if the game is over or that turn has already ended.
    pub fn expire_turn(&mut self, turn: u64) -> bool {
        if self.is_game_over() || turn != self.turn {
            return false;
        }
        info!(player = %self.current_player, turn, "turn time expired");
        self.switch_player();
        true
    }

    /// End the game from outside the rules; the active player loses.
    pub fn force_outcome(&mut self, end: ForcedEnd) -> Result<Outcome, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }
        let reason = match end {
            ForcedEnd::Resigned => WinReason::Resigned,
            ForcedEnd::TimeExpired => WinReason::TimeExpired,
        };
        let outcome = Outcome::Win {
            winner: self.current_player.opponent(),
            reason,
        };
        self.selection = None;
        self.outcome = Some(outcome);
        info!(%outcome, "game over");
        Ok(outcome)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a position from `(row, col, owner, rank)` tuples.
    fn position(pieces: &[(usize, usize, Player, Rank)], to_move: Player) -> GameState {
        let mut board = Board::empty();
        for &(row, col, owner, rank) in pieces {
            board.place(Position::new(row, col), owner, rank);
        }
        GameState::from_parts(board, to_move, Scores::default(), 0)
    }

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    use crate::board::Player::{Black, White};
    use crate::board::Rank::{King, Man};

    #[test]
    fn test_new_game() {
        let game = GameState::new();

        assert_eq!(game.current_player(), Black);
        assert_eq!(game.phase(), TurnPhase::AwaitingSelection);
        assert!(!game.capture_mandatory());
        assert_eq!(game.moves_since_progress(), 0);
        assert_eq!(game.board().piece_count(), 24);
        assert!(game.outcome().is_none());
    }

    #[test]
    fn test_select_opponent_piece_rejected() {
        let mut game = GameState::new();
        let before = game.clone();

        assert_eq!(game.select_piece(pos(5, 0)), Err(GameError::NotYourPiece));
        assert_eq!(game.select_piece(pos(3, 0)), Err(GameError::EmptySquare));
        assert_eq!(game, before);
    }

    #[test]
    fn test_mandatory_capture_blocks_other_pieces() {
        let mut game = position(
            &[
                (2, 3, Black, Man),
                (3, 4, White, Man),
                (0, 7, Black, Man),
            ],
            Black,
        );
        assert!(game.capture_mandatory());
        assert_eq!(game.capturing_pieces(), vec![pos(2, 3)]);

        assert_eq!(game.select_piece(pos(0, 7)), Err(GameError::MustCapture));
        assert!(game.selection().is_none());

        let moves = game.select_piece(pos(2, 3)).unwrap();
        assert_eq!(moves, vec![Move::capture(pos(2, 3), pos(4, 5), pos(3, 4))]);
        assert_eq!(game.phase(), TurnPhase::PieceSelected);
    }

    #[test]
    fn test_invalid_destination_leaves_state() {
        let mut game = GameState::new();
        game.select_piece(pos(2, 1)).unwrap();
        let before = game.clone();

        assert_eq!(
            game.choose_destination(pos(4, 3)),
            Err(GameError::InvalidDestination)
        );
        assert_eq!(
            game.choose_move(Move::simple(pos(2, 1), pos(3, 4))),
            Err(GameError::InvalidDestination)
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_choose_without_selection() {
        let mut game = GameState::new();
        assert_eq!(
            game.choose_destination(pos(3, 2)),
            Err(GameError::NoSelection)
        );
    }

    #[test]
    fn test_simple_move_switches_player() {
        let mut game = GameState::new();
        let id = game.board().get(pos(2, 1)).unwrap().id;

        game.select_piece(pos(2, 1)).unwrap();
        let report = game.choose_destination(pos(3, 2)).unwrap();

        assert!(!report.continuation);
        assert!(report.captured.is_none());
        assert_eq!(game.current_player(), White);
        assert_eq!(game.turn(), 1);
        assert_eq!(game.board().find(id), Some(pos(3, 2)));
        assert_eq!(game.phase(), TurnPhase::AwaitingSelection);
    }

    #[test]
    fn test_capture_removes_exactly_one_piece() {
        let mut game = position(
            &[
                (2, 3, Black, Man),
                (3, 4, White, Man),
                (6, 1, White, Man),
            ],
            Black,
        );
        let before = game.board().piece_count();

        let report = game
            .play(Move::capture(pos(2, 3), pos(4, 5), pos(3, 4)))
            .unwrap();

        assert_eq!(game.board().piece_count(), before - 1);
        assert_eq!(report.captured.map(|p| p.owner), Some(White));
        assert!(game.board().is_empty(pos(3, 4)));
        assert_eq!(game.scores(), Scores { black: 1, white: 0 });
        assert_eq!(game.current_player(), White);
    }

    #[test]
    fn test_multi_jump_keeps_turn() {
        let mut game = position(
            &[
                (2, 1, Black, Man),
                (3, 2, White, Man),
                (5, 4, White, Man),
                (7, 0, White, Man),
            ],
            Black,
        );
        game.moves_since_progress = 7;

        let first = game
            .play(Move::capture(pos(2, 1), pos(4, 3), pos(3, 2)))
            .unwrap();

        assert!(first.continuation);
        assert_eq!(game.current_player(), Black);
        assert_eq!(game.phase(), TurnPhase::Chained);
        assert_eq!(game.moves_since_progress(), 0);
        assert_eq!(
            game.legal_moves(),
            vec![Move::capture(pos(4, 3), pos(6, 5), pos(5, 4))]
        );

        // No other piece, no backing out
        assert_eq!(game.select_piece(pos(7, 0)), Err(GameError::ChainInProgress));
        assert_eq!(game.deselect(), Err(GameError::ChainInProgress));

        let second = game.choose_destination(pos(6, 5)).unwrap();

        assert!(!second.continuation);
        assert!(!second.promoted);
        assert_eq!(game.current_player(), White);
        assert_eq!(game.scores().black, 2);
        assert_eq!(game.board().get(pos(6, 5)).map(|p| p.rank), Some(Man));
        assert!(game.outcome().is_none());
    }

    #[test]
    fn test_promotion_on_back_rank() {
        let mut game = position(&[(6, 1, Black, Man), (5, 6, White, Man)], Black);
        let id = game.board().get(pos(6, 1)).unwrap().id;
        game.moves_since_progress = 12;

        let report = game.play(Move::simple(pos(6, 1), pos(7, 2))).unwrap();

        assert!(report.promoted);
        let crowned = game.board().get(pos(7, 2)).unwrap();
        assert_eq!(crowned.rank, King);
        assert_eq!(crowned.id, id);
        assert_eq!(game.moves_since_progress(), 0);
    }

    #[test]
    fn test_white_promotes_on_row_zero() {
        let mut game = position(&[(1, 2, White, Man), (5, 0, Black, Man)], White);

        let report = game.play(Move::simple(pos(1, 2), pos(0, 1))).unwrap();

        assert!(report.promoted);
        assert!(game.board().get(pos(0, 1)).unwrap().is_king());
    }

    #[test]
    fn test_chain_through_back_rank_stays_a_man() {
        let mut game = position(
            &[
                (5, 2, Black, Man),
                (6, 3, White, Man),
                (6, 5, White, Man),
                (3, 0, White, Man),
            ],
            Black,
        );

        let first = game
            .play(Move::capture(pos(5, 2), pos(7, 4), pos(6, 3)))
            .unwrap();
        assert!(first.continuation);
        assert!(!first.promoted);
        assert_eq!(game.board().get(pos(7, 4)).map(|p| p.rank), Some(Man));

        let second = game.choose_destination(pos(5, 6)).unwrap();
        assert!(!second.continuation);
        assert!(!second.promoted);
        assert_eq!(game.board().get(pos(5, 6)).map(|p| p.rank), Some(Man));
    }

    #[test]
    fn test_chain_ending_on_back_rank_promotes() {
        let mut game = position(
            &[(5, 2, Black, Man), (6, 3, White, Man), (3, 0, White, Man)],
            Black,
        );

        let report = game
            .play(Move::capture(pos(5, 2), pos(7, 4), pos(6, 3)))
            .unwrap();

        assert!(!report.continuation);
        assert!(report.promoted);
        assert!(game.board().get(pos(7, 4)).unwrap().is_king());
    }

    #[test]
    fn test_king_move_counts_toward_draw() {
        let mut game = position(
            &[
                (0, 3, Black, King),
                (0, 7, Black, Man),
                (7, 0, White, Man),
                (7, 4, White, King),
            ],
            Black,
        );

        game.play(Move::simple(pos(0, 3), pos(1, 2))).unwrap();
        assert_eq!(game.moves_since_progress(), 1);

        game.play(Move::simple(pos(7, 0), pos(6, 1))).unwrap();
        assert_eq!(game.moves_since_progress(), 0);
    }

    #[test]
    fn test_fifty_half_move_draw() {
        let mut game = position(
            &[
                (0, 3, Black, King),
                (0, 7, Black, Man),
                (7, 0, White, Man),
                (7, 4, White, King),
            ],
            Black,
        );
        game.moves_since_progress = 49;

        let report = game.play(Move::simple(pos(0, 3), pos(1, 2))).unwrap();

        assert_eq!(game.moves_since_progress(), 50);
        assert_eq!(
            report.outcome,
            Some(Outcome::Draw {
                reason: DrawReason::NoProgress
            })
        );
        assert_eq!(game.outcome().unwrap().reason(), "50-half-move rule");
        assert_eq!(game.select_piece(pos(7, 0)), Err(GameError::GameOver));
        assert_eq!(game.phase(), TurnPhase::Finished);
    }

    #[test]
    fn test_one_king_each_is_a_draw() {
        let mut game = position(
            &[
                (2, 1, Black, King),
                (3, 2, White, Man),
                (7, 6, White, King),
            ],
            Black,
        );

        let report = game
            .play(Move::capture(pos(2, 1), pos(4, 3), pos(3, 2)))
            .unwrap();

        assert_eq!(
            report.outcome,
            Some(Outcome::Draw {
                reason: DrawReason::OneKingEach
            })
        );
    }

    #[test]
    fn test_two_kings_vs_one_is_a_draw() {
        let mut game = position(
            &[
                (2, 1, Black, King),
                (0, 7, Black, King),
                (3, 2, White, Man),
                (7, 6, White, King),
            ],
            Black,
        );

        let report = game
            .play(Move::capture(pos(2, 1), pos(4, 3), pos(3, 2)))
            .unwrap();

        assert_eq!(report.outcome.unwrap().reason(), "2 kings vs 1 king");
    }

    #[test]
    fn test_three_kings_vs_one_plays_on() {
        let board = {
            let mut board = Board::empty();
            board.place(pos(0, 1), Black, King);
            board.place(pos(0, 3), Black, King);
            board.place(pos(0, 5), Black, King);
            board.place(pos(7, 6), White, King);
            board
        };

        assert_eq!(evaluate(&board, White, 0, 50), None);
    }

    #[test]
    fn test_one_king_vs_two_is_a_draw() {
        let board = {
            let mut board = Board::empty();
            board.place(pos(0, 1), Black, King);
            board.place(pos(7, 4), White, King);
            board.place(pos(7, 6), White, King);
            board
        };

        assert_eq!(
            evaluate(&board, Black, 0, 50),
            Some(Outcome::Draw {
                reason: DrawReason::TwoKingsVsOne
            })
        );
    }

    #[test]
    fn test_last_piece_captured_wins() {
        let mut game = position(&[(2, 1, Black, Man), (3, 2, White, Man)], Black);

        let report = game
            .play(Move::capture(pos(2, 1), pos(4, 3), pos(3, 2)))
            .unwrap();

        assert_eq!(
            report.outcome,
            Some(Outcome::Win {
                winner: Black,
                reason: WinReason::NoPiecesLeft
            })
        );
    }

    #[test]
    fn test_blocked_player_loses() {
        let mut game = position(
            &[
                (2, 1, Black, Man),
                (6, 1, Black, Man),
                (5, 2, Black, Man),
                (7, 0, White, Man),
            ],
            Black,
        );

        let report = game.play(Move::simple(pos(2, 1), pos(3, 2))).unwrap();

        assert_eq!(
            report.outcome,
            Some(Outcome::Win {
                winner: Black,
                reason: WinReason::Blocked
            })
        );
        assert_eq!(game.outcome().unwrap().reason(), "blocked, no legal move");
    }

    #[test]
    fn test_resignation() {
        let mut game = GameState::new();
        game.select_piece(pos(2, 1)).unwrap();

        let outcome = game.force_outcome(ForcedEnd::Resigned).unwrap();

        assert_eq!(outcome.winner(), Some(White));
        assert_eq!(outcome.reason(), "resigned");
        assert!(game.selection().is_none());
        assert_eq!(
            game.force_outcome(ForcedEnd::TimeExpired),
            Err(GameError::GameOver)
        );
        assert_eq!(
            game.play(Move::simple(pos(2, 3), pos(3, 4))),
            Err(GameError::GameOver)
        );
    }

    #[test]
    fn test_stale_expiry_is_ignored() {
        let mut game = GameState::new();
        let armed_for = game.turn();

        game.play(Move::simple(pos(2, 1), pos(3, 2))).unwrap();
        assert!(!game.expire_turn(armed_for));
        assert_eq!(game.current_player(), White);

        game.select_piece(pos(5, 0)).unwrap();
        assert!(game.expire_turn(game.turn()));
        assert_eq!(game.current_player(), Black);
        assert!(game.selection().is_none());
    }

    #[test]
    fn test_expiry_discards_pending_chain() {
        let mut game = position(
            &[
                (2, 1, Black, Man),
                (3, 2, White, Man),
                (5, 4, White, Man),
                (7, 0, White, Man),
            ],
            Black,
        );
        game.play(Move::capture(pos(2, 1), pos(4, 3), pos(3, 2)))
            .unwrap();
        assert_eq!(game.phase(), TurnPhase::Chained);

        assert!(game.expire_turn(game.turn()));
        assert_eq!(game.current_player(), White);
        assert_eq!(game.phase(), TurnPhase::AwaitingSelection);
    }

    #[test]
    fn test_expiry_at_no_progress_limit_draws() {
        let mut game = position(
            &[
                (0, 3, Black, King),
                (0, 7, Black, Man),
                (7, 0, White, Man),
                (7, 4, White, King),
            ],
            Black,
        );
        game.moves_since_progress = NO_PROGRESS_LIMIT;

        assert!(game.expire_turn(game.turn()));

        assert_eq!(game.current_player(), White);
        assert_eq!(
            game.outcome(),
            Some(&Outcome::Draw {
                reason: DrawReason::NoProgress
            })
        );
        assert!(!game.expire_turn(game.turn()));
    }

    #[test]
    fn test_inconsistent_move_aborts_untouched() {
        let mut game = GameState::new();
        game.select_piece(pos(2, 1)).unwrap();

        // A capture over an empty square slipped into the offered list
        let bogus = Move::capture(pos(2, 1), pos(4, 3), pos(3, 2));
        if let Some(sel) = game.selection.as_mut() {
            sel.moves.push(bogus);
        }
        let before = game.clone();

        let err = game.choose_move(bogus).unwrap_err();

        assert!(matches!(err, GameError::InternalInconsistency(_)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_reselect_switches_piece() {
        let mut game = GameState::new();
        game.select_piece(pos(2, 1)).unwrap();
        game.select_piece(pos(2, 3)).unwrap();

        assert_eq!(game.selection().unwrap().from, pos(2, 3));

        game.deselect().unwrap();
        assert_eq!(game.phase(), TurnPhase::AwaitingSelection);
    }
}
