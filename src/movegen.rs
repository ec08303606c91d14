use crate::board::{Board, Piece, Player, Position, Rank};
use serde::{Deserialize, Serialize};
use std::fmt;

const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MoveKind {
    Simple,
    Capture { jumped: Position },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub kind: MoveKind,
}

impl Move {
    pub fn simple(from: Position, to: Position) -> Self {
        Move {
            from,
            to,
            kind: MoveKind::Simple,
        }
    }

    pub fn capture(from: Position, to: Position, jumped: Position) -> Self {
        Move {
            from,
            to,
            kind: MoveKind::Capture { jumped },
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.kind, MoveKind::Capture { .. })
    }

    pub fn jumped(&self) -> Option<Position> {
        match self.kind {
            MoveKind::Capture { jumped } => Some(jumped),
            MoveKind::Simple => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MoveKind::Simple => write!(f, "{} -> {}", self.from, self.to),
            MoveKind::Capture { jumped } => {
                write!(f, "{} x {} -> {}", self.from, jumped, self.to)
            }
        }
    }
}

/// Whether a piece's move list should be narrowed to its captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFilter {
    /// Every move the piece has, simple and capture alike.
    All,
    /// Only the captures when the piece has at least one, otherwise everything.
    PreferCaptures,
}

/// Candidate moves for the piece standing on `from`. Empty if the square is empty.
pub fn generate_moves(board: &Board, from: Position, filter: MoveFilter) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    let mut moves = match piece.rank {
        Rank::Man => man_moves(board, from, piece),
        Rank::King => king_moves(board, from, piece),
    };

    if filter == MoveFilter::PreferCaptures && moves.iter().any(Move::is_capture) {
        moves.retain(Move::is_capture);
    }

    moves
}

/// Capture moves only, regardless of whether simple moves exist.
pub fn capture_moves(board: &Board, from: Position) -> Vec<Move> {
    let mut moves = generate_moves(board, from, MoveFilter::All);
    moves.retain(Move::is_capture);
    moves
}

fn is_opponent(board: &Board, pos: Position, owner: Player) -> bool {
    board.get(pos).is_some_and(|other| other.owner != owner)
}

fn man_moves(board: &Board, from: Position, piece: Piece) -> Vec<Move> {
    let mut moves = Vec::new();

    // Men step forward only
    let forward = piece.owner.forward();
    for dc in [-1, 1] {
        if let Some(to) = from.offset(forward, dc) {
            if board.is_empty(to) {
                moves.push(Move::simple(from, to));
            }
        }
    }

    // ...but jump in all four directions
    for &(dr, dc) in &DIAGONALS {
        let (Some(over), Some(to)) = (from.offset(dr, dc), from.offset(2 * dr, 2 * dc)) else {
            continue;
        };
        if board.is_empty(to) && is_opponent(board, over, piece.owner) {
            moves.push(Move::capture(from, to, over));
        }
    }

    moves
}

fn king_moves(board: &Board, from: Position, piece: Piece) -> Vec<Move> {
    let mut moves = Vec::new();

    for &(dr, dc) in &DIAGONALS {
        let mut current = from;

        while let Some(next) = current.offset(dr, dc) {
            match board.get(next) {
                None => {
                    moves.push(Move::simple(from, next));
                    current = next;
                }
                Some(other) if other.owner != piece.owner => {
                    // One landing square: the first one past the jumped piece
                    if let Some(landing) = next.offset(dr, dc) {
                        if board.is_empty(landing) {
                            moves.push(Move::capture(from, landing, next));
                        }
                    }
                    break;
                }
                Some(_) => break,
            }
        }
    }

    moves
}

/// True if any piece of `player` has a capture available.
pub fn has_mandatory_capture(board: &Board, player: Player) -> bool {
    board
        .pieces_of(player)
        .any(|(pos, _)| !capture_moves(board, pos).is_empty())
}

/// Squares of every piece of `player` that can capture, in board scan order.
pub fn pieces_with_capture(board: &Board, player: Player) -> Vec<Position> {
    board
        .pieces_of(player)
        .map(|(pos, _)| pos)
        .filter(|&pos| !capture_moves(board, pos).is_empty())
        .collect()
}

/// Every move `player` may legally play under the mandatory-capture rule.
pub fn legal_moves(board: &Board, player: Player) -> Vec<Move> {
    let all: Vec<Move> = board
        .pieces_of(player)
        .flat_map(|(pos, _)| generate_moves(board, pos, MoveFilter::All))
        .collect();

    if all.iter().any(Move::is_capture) {
        all.into_iter().filter(Move::is_capture).collect()
    } else {
        all
    }
}
