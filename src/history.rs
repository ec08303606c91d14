use crate::game::{Outcome, Scores};
use crate::save::PlayerNames;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stands in for the winner's name when a game is drawn.
pub const DRAW_MARKER: &str = "Draw";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub date: DateTime<Local>,
    pub winner: String,
    /// Loser's name, or "<black> vs <white>" for a draw.
    pub loser: String,
    pub reason: String,
    /// For a draw: Black's score.
    pub winner_score: u32,
    /// For a draw: White's score.
    pub loser_score: u32,
}

impl GameRecord {
    pub fn new(outcome: &Outcome, names: &PlayerNames, scores: Scores, date: DateTime<Local>) -> Self {
        match outcome.winner() {
            Some(winner) => {
                let loser = winner.opponent();
                GameRecord {
                    date,
                    winner: names.get(winner).to_string(),
                    loser: names.get(loser).to_string(),
                    reason: outcome.reason().to_string(),
                    winner_score: scores.get(winner),
                    loser_score: scores.get(loser),
                }
            }
            None => GameRecord {
                date,
                winner: DRAW_MARKER.to_string(),
                loser: format!("{} vs {}", names.black, names.white),
                reason: outcome.reason().to_string(),
                winner_score: scores.black,
                loser_score: scores.white,
            },
        }
    }

    pub fn is_draw(&self) -> bool {
        self.winner == DRAW_MARKER
    }
}

/// Games won per player name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinCounts(HashMap<String, u32>);

impl WinCounts {
    pub fn record_win(&mut self, name: &str) {
        *self.0.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, name: &str) -> u32 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Most wins first; ties by name.
    pub fn ranking(&self) -> Vec<(String, u32)> {
        let mut entries: Vec<(String, u32)> =
            self.0.iter().map(|(name, wins)| (name.clone(), *wins)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}
