//! Persisted record formats. Storage itself belongs to the embedding application.

use chromino_core::{
    Board, Difficulty, GameError, GameSession, GameStats, Hint, Piece, PieceId, PlacedPiece,
    SessionParts, SessionRules, SessionStatus,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const RECORD_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt session: {0}")]
    Game(#[from] GameError),
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u32),
    #[error("stored board does not match the placed pieces")]
    BoardMismatch,
    #[error("cannot format timestamp: {0}")]
    TimestampFormat(#[from] time::error::Format),
    #[error("cannot parse timestamp: {0}")]
    TimestampParse(#[from] time::error::Parse),
}

pub type Result<T, E = ProtocolError> = core::result::Result<T, E>;

/// Snapshot of a session in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub version: u32,
    pub board: Board,
    pub target_board: Board,
    pub pieces: Vec<Piece>,
    pub placed_pieces: Vec<PlacedPiece>,
    pub selected_piece: Option<PieceId>,
    pub score: u32,
    pub level: u32,
    pub difficulty: Difficulty,
    pub hints_used: u8,
    pub status: SessionStatus,
    /// Milliseconds since the UNIX epoch.
    pub start_time: u64,
    #[serde(default)]
    pub paused_at: Option<u64>,
    #[serde(default)]
    pub active_hint: Option<Hint>,
    #[serde(default)]
    pub hint_seed: u64,
    #[serde(default)]
    pub rules: SessionRules,
}

impl SessionRecord {
    pub fn capture(session: &GameSession) -> Self {
        let parts = session.to_parts();
        Self {
            version: RECORD_VERSION,
            board: session.board().clone(),
            target_board: parts.target,
            pieces: parts.pool,
            placed_pieces: parts.placed,
            selected_piece: parts.selected,
            score: parts.score,
            level: parts.level,
            difficulty: parts.difficulty,
            hints_used: parts.hints_used,
            status: parts.status,
            start_time: parts.started_at,
            paused_at: parts.paused_at,
            active_hint: parts.active_hint,
            hint_seed: parts.hint_seed,
            rules: parts.rules,
        }
    }

    /// Rebuilds the session by replaying the placed pieces, rejecting records whose stored
    /// board disagrees with that replay.
    pub fn restore(self) -> Result<GameSession> {
        if self.version != RECORD_VERSION {
            return Err(ProtocolError::UnsupportedVersion(self.version));
        }

        let stored = self.board;
        let session = GameSession::from_parts(SessionParts {
            target: self.target_board,
            pool: self.pieces,
            placed: self.placed_pieces,
            selected: self.selected_piece,
            hints_used: self.hints_used,
            score: self.score,
            level: self.level,
            difficulty: self.difficulty,
            status: self.status,
            started_at: self.start_time,
            paused_at: self.paused_at,
            active_hint: self.active_hint,
            hint_seed: self.hint_seed,
            rules: self.rules,
        })?;
        if *session.board() != stored {
            return Err(ProtocolError::BoardMismatch);
        }
        Ok(session)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub games_played: u32,
    pub games_won: u32,
    pub average_time: u64,
    pub best_time: u64,
    pub hints_used: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl From<GameStats> for StatsRecord {
    fn from(stats: GameStats) -> Self {
        Self {
            games_played: stats.games_played,
            games_won: stats.games_won,
            average_time: stats.average_time,
            best_time: stats.best_time,
            hints_used: stats.hints_used,
            current_streak: stats.current_streak,
            best_streak: stats.best_streak,
        }
    }
}

impl From<StatsRecord> for GameStats {
    fn from(record: StatsRecord) -> Self {
        Self {
            games_played: record.games_played,
            games_won: record.games_won,
            average_time: record.average_time,
            best_time: record.best_time,
            hints_used: record.hints_used,
            current_streak: record.current_streak,
            best_streak: record.best_streak,
        }
    }
}

/// Everything a player can export and import in one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBundle {
    pub game_state: Option<SessionRecord>,
    pub stats: StatsRecord,
    /// RFC 3339.
    pub export_date: String,
}

impl SaveBundle {
    pub fn new(
        session: Option<&GameSession>,
        stats: GameStats,
        exported_at: OffsetDateTime,
    ) -> Result<Self> {
        Ok(Self {
            game_state: session.map(SessionRecord::capture),
            stats: stats.into(),
            export_date: exported_at.format(&Rfc3339)?,
        })
    }

    pub fn exported_at(&self) -> Result<OffsetDateTime> {
        Ok(OffsetDateTime::parse(&self.export_date, &Rfc3339)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a bundle, including the timestamp and the session it carries.
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: Self = serde_json::from_str(json)?;
        bundle.exported_at()?;
        if let Some(record) = &bundle.game_state {
            record.clone().restore()?;
        }
        Ok(bundle)
    }
}
