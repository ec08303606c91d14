use serde::{Deserialize, Serialize};
use std::fmt;

/// Board size constants
pub const BOARD_SIZE: usize = 8;
pub const PIECES_PER_SIDE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Black, // starts on rows 0-2, moves first
    White, // starts on rows 5-7
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Row delta of a man's forward step.
    pub fn forward(&self) -> i32 {
        match self {
            Player::Black => 1,
            Player::White => -1,
        }
    }

    /// The opponent's back rank, where this player's men are crowned.
    pub fn promotion_row(&self) -> usize {
        match self {
            Player::Black => BOARD_SIZE - 1,
            Player::White => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Player::Black => "Black",
            Player::White => "White",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Man,
    King,
}

/// Stable identity of a piece for the whole game. A piece keeps its id when it
/// moves or is crowned; ids of captured pieces are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub owner: Player,
    pub rank: Rank,
}

impl Piece {
    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Dark squares are the only ones pieces ever stand on.
    pub fn is_playable(&self) -> bool {
        self.in_bounds() && (self.row + self.col) % 2 == 1
    }

    /// Step `(dr, dc)` away from this square, or `None` when that leaves the board.
    pub fn offset(&self, dr: i32, dc: i32) -> Option<Position> {
        let r = self.row as i32 + dr;
        let c = self.col as i32 + dc;
        if r < 0 || r >= BOARD_SIZE as i32 || c < 0 || c >= BOARD_SIZE as i32 {
            return None;
        }
        Some(Position::new(r as usize, c as usize))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCount {
    pub men: usize,
    pub kings: usize,
}

impl SideCount {
    pub fn total(&self) -> usize {
        self.men + self.kings
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCount {
    pub black: SideCount,
    pub white: SideCount,
}

impl MaterialCount {
    pub fn side(&self, player: Player) -> SideCount {
        match player {
            Player::Black => self.black,
            Player::White => self.white,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
    next_id: u8,
}

impl Board {
    /// A board with no pieces on it.
    pub fn empty() -> Self {
        Board {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
            next_id: 0,
        }
    }

    /// Standard opening layout: Black men on rows 0-2, White men on rows 5-7.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let pos = Position::new(row, col);
                if !pos.is_playable() {
                    continue;
                }
                if row < 3 {
                    board.place(pos, Player::Black, Rank::Man);
                } else if row > 4 {
                    board.place(pos, Player::White, Rank::Man);
                }
            }
        }
        board
    }

    pub fn get(&self, pos: Position) -> Option<Piece> {
        if pos.in_bounds() {
            self.squares[pos.row][pos.col]
        } else {
            None
        }
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// Put a fresh piece on a dark square, replacing whatever stood there.
    pub fn place(&mut self, pos: Position, owner: Player, rank: Rank) -> PieceId {
        debug_assert!(pos.is_playable(), "pieces only stand on dark squares: {pos}");
        let id = PieceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.squares[pos.row][pos.col] = Some(Piece { id, owner, rank });
        id
    }

    /// Take a piece off the board for good.
    pub fn remove(&mut self, pos: Position) -> Option<Piece> {
        if !pos.in_bounds() {
            return None;
        }
        self.squares[pos.row][pos.col].take()
    }

    /// Move the piece on `from` to the empty square `to`, keeping its identity.
    pub(crate) fn relocate(&mut self, from: Position, to: Position) -> Option<Piece> {
        if !to.in_bounds() || !self.is_empty(to) {
            return None;
        }
        let piece = self.remove(from)?;
        self.squares[to.row][to.col] = Some(piece);
        Some(piece)
    }

    /// Crown the man on `pos`. Returns false if there is no man there.
    pub(crate) fn promote(&mut self, pos: Position) -> bool {
        match self.squares[pos.row][pos.col].as_mut() {
            Some(piece) if piece.rank == Rank::Man => {
                piece.rank = Rank::King;
                true
            }
            _ => false,
        }
    }

    /// All pieces with their squares, scanned row by row.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        (0..BOARD_SIZE).flat_map(move |row| {
            (0..BOARD_SIZE).filter_map(move |col| {
                self.squares[row][col].map(|piece| (Position::new(row, col), piece))
            })
        })
    }

    pub fn pieces_of(&self, owner: Player) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.pieces().filter(move |(_, piece)| piece.owner == owner)
    }

    pub fn find(&self, id: PieceId) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| piece.id == id)
            .map(|(pos, _)| pos)
    }

    pub fn piece_count(&self) -> usize {
        self.pieces().count()
    }

    pub fn material(&self) -> MaterialCount {
        let mut counts = MaterialCount::default();
        for (_, piece) in self.pieces() {
            let side = match piece.owner {
                Player::Black => &mut counts.black,
                Player::White => &mut counts.white,
            };
            match piece.rank {
                Rank::Man => side.men += 1,
                Rank::King => side.kings += 1,
            }
        }
        counts
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for col in 0..BOARD_SIZE {
            write!(f, " {}", col)?;
        }
        writeln!(f)?;

        for row in 0..BOARD_SIZE {
            write!(f, "{} ", row)?;
            for col in 0..BOARD_SIZE {
                let pos = Position::new(row, col);
                let c = if !pos.is_playable() {
                    ' '
                } else {
                    match self.get(pos) {
                        Some(Piece { owner: Player::Black, rank: Rank::Man, .. }) => 'b',
                        Some(Piece { owner: Player::Black, rank: Rank::King, .. }) => 'B',
                        Some(Piece { owner: Player::White, rank: Rank::Man, .. }) => 'w',
                        Some(Piece { owner: Player::White, rank: Rank::King, .. }) => 'W',
                        None => '.',
                    }
                };
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let board = Board::standard();
        let counts = board.material();

        assert_eq!(counts.black, SideCount { men: 12, kings: 0 });
        assert_eq!(counts.white, SideCount { men: 12, kings: 0 });

        // Middle rows are empty
        for row in 3..5 {
            for col in 0..BOARD_SIZE {
                assert!(board.is_empty(Position::new(row, col)));
            }
        }

        // Nothing on light squares
        for (pos, _) in board.pieces() {
            assert!(pos.is_playable());
        }
    }

    #[test]
    fn test_offset_bounds() {
        let corner = Position::new(0, 1);
        assert_eq!(corner.offset(-1, 1), None);
        assert_eq!(corner.offset(1, -1), Some(Position::new(1, 0)));
        assert_eq!(Position::new(7, 6).offset(1, 1), None);
        assert_eq!(Position::new(7, 6).offset(-2, -2), Some(Position::new(5, 4)));
    }

    #[test]
    fn test_out_of_bounds_lookup_is_empty() {
        let board = Board::standard();
        assert_eq!(board.get(Position::new(8, 1)), None);
        assert_eq!(board.get(Position::new(0, 9)), None);
    }

    #[test]
    fn test_relocate_keeps_identity() {
        let mut board = Board::empty();
        let id = board.place(Position::new(2, 1), Player::Black, Rank::Man);

        let moved = board.relocate(Position::new(2, 1), Position::new(3, 2)).unwrap();

        assert_eq!(moved.id, id);
        assert_eq!(board.find(id), Some(Position::new(3, 2)));
        assert!(board.is_empty(Position::new(2, 1)));
    }

    #[test]
    fn test_relocate_refuses_occupied_target() {
        let mut board = Board::empty();
        board.place(Position::new(2, 1), Player::Black, Rank::Man);
        board.place(Position::new(3, 2), Player::White, Rank::Man);

        assert!(board.relocate(Position::new(2, 1), Position::new(3, 2)).is_none());
        assert_eq!(board.piece_count(), 2);
    }

    #[test]
    fn test_promote_only_men() {
        let mut board = Board::empty();
        board.place(Position::new(7, 0), Player::Black, Rank::Man);

        assert!(board.promote(Position::new(7, 0)));
        assert!(!board.promote(Position::new(7, 0)));
        assert_eq!(board.get(Position::new(7, 0)).unwrap().rank, Rank::King);
    }

    #[test]
    fn test_promotion_rows() {
        assert_eq!(Player::Black.promotion_row(), 7);
        assert_eq!(Player::White.promotion_row(), 0);
        assert_eq!(Player::Black.forward(), 1);
        assert_eq!(Player::White.forward(), -1);
    }

    #[test]
    fn test_display_marks_kings() {
        let mut board = Board::empty();
        board.place(Position::new(0, 1), Player::Black, Rank::King);
        board.place(Position::new(7, 0), Player::White, Rank::Man);

        let text = board.to_string();
        assert!(text.contains('B'));
        assert!(text.contains('w'));
        assert!(!text.contains('b'));
    }
}
