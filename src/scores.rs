use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Each game keeps at most this many records.
const MAX_ENTRIES: usize = 10;
const FILE_NAME: &str = "minicade.scores.json";

#[derive(Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub user: String,
    pub score: u32,
}

/// Per-game top-10 score tables, persisted as JSON next to the executable.
/// A missing or malformed file silently becomes an empty board; the games
/// themselves never see this type.
pub struct Leaderboard {
    games: BTreeMap<String, Vec<ScoreEntry>>,
    path: PathBuf,
}

impl Leaderboard {
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    fn load_from(path: PathBuf) -> Self {
        let games = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(games) => games,
                Err(err) => {
                    log::warn!("leaderboard file unreadable, starting empty: {err}");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { games, path }
    }

    fn default_path() -> PathBuf {
        // Store next to the executable.
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                return dir.join(FILE_NAME);
            }
        }
        PathBuf::from(FILE_NAME)
    }

    /// Insert a finished run, keep the table sorted descending and capped,
    /// and persist. Persistence failures are logged, never fatal.
    pub fn record(&mut self, game: &str, user: &str, score: u32) {
        let table = self.games.entry(game.to_string()).or_default();
        table.push(ScoreEntry {
            user: user.to_string(),
            score,
        });
        table.sort_by(|a, b| b.score.cmp(&a.score));
        table.truncate(MAX_ENTRIES);
        log::debug!("recorded {score} for {user} in {game}");
        if let Err(err) = self.save() {
            log::warn!("failed to save leaderboard: {err:#}");
        }
    }

    pub fn top(&self, game: &str) -> &[ScoreEntry] {
        self.games.get(game).map(Vec::as_slice).unwrap_or(&[])
    }

    fn save(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.games)?;
        // Write-then-rename so a crash can't leave a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("minicade-test-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn tables_stay_sorted_and_capped() {
        let path = scratch("cap");
        let mut lb = Leaderboard::load_from(path.clone());
        for i in 0..15u32 {
            lb.record("snake", "ava", i * 10);
        }
        let top = lb.top("snake");
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].score, 140);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn records_round_trip_through_disk() {
        let path = scratch("roundtrip");
        {
            let mut lb = Leaderboard::load_from(path.clone());
            lb.record("froghop", "ben", 1500);
        }
        let lb = Leaderboard::load_from(path.clone());
        assert_eq!(lb.top("froghop").len(), 1);
        assert_eq!(lb.top("froghop")[0].score, 1500);
        assert_eq!(lb.top("froghop")[0].user, "ben");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_falls_back_to_empty() {
        let path = scratch("malformed");
        fs::write(&path, b"{ not json").unwrap();
        let lb = Leaderboard::load_from(path.clone());
        assert!(lb.top("snake").is_empty());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_empty_board() {
        let lb = Leaderboard::load_from(scratch("missing-never-created"));
        assert!(lb.top("carrace").is_empty());
    }

    #[test]
    fn unknown_game_key_is_empty() {
        let lb = Leaderboard::load_from(scratch("unknown-never-created"));
        assert!(lb.top("nope").is_empty());
    }
}
