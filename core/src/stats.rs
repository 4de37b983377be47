use serde::{Deserialize, Serialize};

/// Summary of a solved level, handed to a [`StatsRecorder`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinReport {
    pub level: u32,
    pub elapsed_secs: u64,
    pub hints_used: u8,
    pub score: u32,
}

/// Receives session outcomes. Sessions never persist statistics themselves.
pub trait StatsRecorder {
    fn record_win(&mut self, report: &WinReport);

    /// A level left while still playing.
    fn record_abandoned(&mut self);
}

/// Does not record anything.
impl StatsRecorder for () {
    fn record_win(&mut self, _report: &WinReport) {}

    fn record_abandoned(&mut self) {}
}

/// Lifetime player statistics. Times are whole seconds; `best_time` of 0 means none yet.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub games_played: u32,
    pub games_won: u32,
    pub average_time: u64,
    pub best_time: u64,
    pub hints_used: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl GameStats {
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            f64::from(self.games_won) / f64::from(self.games_played)
        }
    }
}

impl StatsRecorder for GameStats {
    fn record_win(&mut self, report: &WinReport) {
        let won = u128::from(self.games_won);
        let total = u128::from(self.average_time) * won + u128::from(report.elapsed_secs);
        self.average_time = u64::try_from(total / (won + 1)).unwrap_or(u64::MAX);
        if self.best_time == 0 || report.elapsed_secs < self.best_time {
            self.best_time = report.elapsed_secs;
        }

        self.games_played = self.games_played.saturating_add(1);
        self.games_won = self.games_won.saturating_add(1);
        self.hints_used = self.hints_used.saturating_add(u32::from(report.hints_used));
        self.current_streak = self.current_streak.saturating_add(1);
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    fn record_abandoned(&mut self) {
        self.games_played = self.games_played.saturating_add(1);
        self.current_streak = 0;
    }
}
