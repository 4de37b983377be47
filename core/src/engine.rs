use alloc::vec::Vec;
use hashbrown::HashSet;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Playing,
    Paused,
    Won,
}

impl SessionStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won)
    }
}

/// Player operations a [`GameSession`] understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Select { piece: Option<PieceId> },
    Place { piece: PieceId, position: Coord2 },
    Remove { piece: PieceId },
    Replace { piece: PieceId, position: Coord2 },
    Rotate { piece: PieceId },
    Flip { piece: PieceId },
    UseHint,
    ClearHint,
    Check,
    Pause,
    Resume,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    NoChange,
    Updated,
    Hint(Hint),
    /// The board does not match the target yet.
    Unsolved,
    Solved(WinReport),
}

impl Outcome {
    pub const fn has_update(&self) -> bool {
        !matches!(self, Self::NoChange | Self::Unsolved)
    }
}

/// Milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// One play-through of a level.
///
/// The board is always the replay of `placed` onto an empty grid. Every operation either
/// succeeds completely or returns an error with the session untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionParts", into = "SessionParts")]
pub struct GameSession {
    board: Board,
    target: Board,
    pool: Vec<Piece>,
    placed: Vec<PlacedPiece>,
    selected: Option<PieceId>,
    hints_used: u8,
    score: u32,
    level: u32,
    difficulty: Difficulty,
    status: SessionStatus,
    started_at: u64,
    paused_at: Option<u64>,
    active_hint: Option<Hint>,
    hint_seed: u64,
    rules: SessionRules,
}

impl GameSession {
    pub fn start(level: Level, number: u32, rules: SessionRules) -> Self {
        Self::start_at(level, number, now_millis(), rules)
    }

    pub fn start_at(level: Level, number: u32, now_ms: u64, rules: SessionRules) -> Self {
        let hint_seed = level
            .seed
            .parse::<LevelSeed>()
            .map(LevelSeed::rng_seed)
            .unwrap_or_default();
        log::debug!(
            "Starting level {} ({} pieces, seed {})",
            number,
            level.pieces.len(),
            level.seed
        );

        Self {
            board: Board::empty(),
            target: level.target,
            pool: level.pieces,
            placed: Vec::new(),
            selected: None,
            hints_used: 0,
            score: rules.initial_score,
            level: number,
            difficulty: level.difficulty,
            status: SessionStatus::Playing,
            started_at: now_ms,
            paused_at: None,
            active_hint: None,
            hint_seed,
            rules,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn target(&self) -> &Board {
        &self.target
    }

    pub fn pool(&self) -> &[Piece] {
        &self.pool
    }

    pub fn placed(&self) -> &[PlacedPiece] {
        &self.placed
    }

    pub fn selected(&self) -> Option<PieceId> {
        self.selected
    }

    pub fn hints_used(&self) -> u8 {
        self.hints_used
    }

    pub fn hints_left(&self) -> u8 {
        self.rules.max_hints.saturating_sub(self.hints_used)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn active_hint(&self) -> Option<&Hint> {
        self.active_hint.as_ref()
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    /// Whole seconds played, not counting time spent paused.
    pub fn elapsed_secs_at(&self, now_ms: u64) -> u64 {
        let until = self.paused_at.unwrap_or(now_ms);
        until.saturating_sub(self.started_at) / 1000
    }

    /// Legality preview for placing a pool piece; never changes the session.
    pub fn can_place(&self, piece: PieceId, position: Coord2) -> bool {
        self.pool_index(piece)
            .is_ok_and(|index| self.board.can_place(&self.pool[index], position))
    }

    pub fn find_occupant(&self, coords: Coord2) -> Option<&PlacedPiece> {
        find_occupant(&self.placed, coords)
    }

    /// The hint [`Self::use_hint`] would hand out, without spending it.
    pub fn hint(&self) -> Option<Hint> {
        let input = HintInput {
            board: &self.board,
            target: &self.target,
            pool: &self.pool,
            selected: self.selected,
            hints_used: self.hints_used,
        };
        let seed = self.hint_seed.wrapping_add(u64::from(self.hints_used));
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_hint(&input, &mut rng)
    }

    /// Applies `action` to a copy, leaving `self` as it was.
    pub fn apply<R: StatsRecorder + ?Sized>(
        &self,
        action: Action,
        recorder: &mut R,
    ) -> Result<(Self, Outcome)> {
        self.apply_at(action, now_millis(), recorder)
    }

    pub fn apply_at<R: StatsRecorder + ?Sized>(
        &self,
        action: Action,
        now_ms: u64,
        recorder: &mut R,
    ) -> Result<(Self, Outcome)> {
        let mut next = self.clone();
        let outcome = next.dispatch(action, now_ms, recorder)?;
        Ok((next, outcome))
    }

    fn dispatch<R: StatsRecorder + ?Sized>(
        &mut self,
        action: Action,
        now_ms: u64,
        recorder: &mut R,
    ) -> Result<Outcome> {
        use Action::*;

        match action {
            Select { piece } => self.select(piece),
            Place { piece, position } => self.place(piece, position),
            Remove { piece } => self.remove(piece),
            Replace { piece, position } => self.replace(piece, position),
            Rotate { piece } => self.rotate(piece),
            Flip { piece } => self.flip(piece),
            UseHint => self.use_hint(),
            ClearHint => self.clear_hint(),
            Check => self.check_at(now_ms, recorder),
            Pause => self.pause_at(now_ms),
            Resume => self.resume_at(now_ms),
        }
    }

    /// Selects a pool piece, or deselects when it is already selected or `piece` is `None`.
    pub fn select(&mut self, piece: Option<PieceId>) -> Result<Outcome> {
        self.check_playing()?;

        let next = match piece {
            Some(id) => {
                self.pool_index(id)?;
                (self.selected != Some(id)).then_some(id)
            }
            None => None,
        };
        if next == self.selected {
            return Ok(Outcome::NoChange);
        }
        self.selected = next;
        Ok(Outcome::Updated)
    }

    pub fn place(&mut self, piece: PieceId, position: Coord2) -> Result<Outcome> {
        self.check_playing()?;

        let index = self.pool_index(piece)?;
        let mut placed = self.placed.clone();
        placed.push(self.pool[index].clone().place_at(position));
        self.commit(placed)?;

        self.pool.remove(index);
        self.after_placement(self.rules.placement_cost);
        log::trace!("Placed {} at {:?}", piece, position);
        Ok(Outcome::Updated)
    }

    /// Returns a placed piece to the pool, keeping its orientation.
    pub fn remove(&mut self, piece: PieceId) -> Result<Outcome> {
        self.check_playing()?;

        let index = self.placed_index(piece)?;
        let mut placed = self.placed.clone();
        let removed = placed.remove(index);
        self.commit(placed)?;

        self.pool.push(removed.into_piece());
        self.active_hint = None;
        Ok(Outcome::Updated)
    }

    /// Swaps whatever covers `position` for a pool piece placed there. Without an occupant this
    /// is a plain placement.
    pub fn replace(&mut self, piece: PieceId, position: Coord2) -> Result<Outcome> {
        self.check_playing()?;

        let index = self.pool_index(piece)?;
        let Some(occupant) = self.find_occupant(position).map(PlacedPiece::id) else {
            return self.place(piece, position);
        };

        let mut placed: Vec<PlacedPiece> = self
            .placed
            .iter()
            .filter(|placed| placed.id() != occupant)
            .cloned()
            .collect();
        placed.push(self.pool[index].clone().place_at(position));
        let evicted = self.placed_index(occupant)?;
        let evicted = self.placed[evicted].clone().into_piece();
        self.commit(placed)?;

        self.pool.remove(index);
        self.pool.push(evicted);
        self.after_placement(self.rules.replace_cost);
        log::trace!("Replaced {} with {} at {:?}", occupant, piece, position);
        Ok(Outcome::Updated)
    }

    pub fn rotate(&mut self, piece: PieceId) -> Result<Outcome> {
        self.check_playing()?;
        let index = self.pool_index(piece)?;
        self.pool[index].rotate();
        Ok(Outcome::Updated)
    }

    pub fn flip(&mut self, piece: PieceId) -> Result<Outcome> {
        self.check_playing()?;
        let index = self.pool_index(piece)?;
        self.pool[index].flip();
        Ok(Outcome::Updated)
    }

    /// Spends one hint. Nothing is charged when no hint applies.
    pub fn use_hint(&mut self) -> Result<Outcome> {
        self.check_playing()?;
        if self.hints_used >= self.rules.max_hints {
            return Err(GameError::HintLimitReached);
        }

        let hint = self.hint().ok_or(GameError::NoHintAvailable)?;
        self.hints_used += 1;
        self.score = self.score.saturating_sub(self.rules.hint_cost);
        self.active_hint = Some(hint.clone());
        log::debug!("Hint {} of {}: {}", self.hints_used, self.rules.max_hints, hint.message());
        Ok(Outcome::Hint(hint))
    }

    pub fn clear_hint(&mut self) -> Result<Outcome> {
        self.check_not_finished()?;
        Ok(match self.active_hint.take() {
            Some(_) => Outcome::Updated,
            None => Outcome::NoChange,
        })
    }

    /// Compares the board with the target and, on a match, ends the session as won.
    pub fn check<R: StatsRecorder + ?Sized>(&mut self, recorder: &mut R) -> Result<Outcome> {
        self.check_at(now_millis(), recorder)
    }

    pub fn check_at<R: StatsRecorder + ?Sized>(
        &mut self,
        now_ms: u64,
        recorder: &mut R,
    ) -> Result<Outcome> {
        self.check_playing()?;
        if !self.board.matches(&self.target) {
            return Ok(Outcome::Unsolved);
        }

        let elapsed_secs = self.elapsed_secs_at(now_ms);
        let penalty = self.rules.hint_penalty.saturating_mul(u32::from(self.hints_used));
        self.score = self
            .score
            .saturating_add(self.rules.time_bonus(elapsed_secs))
            .saturating_sub(penalty);
        self.status = SessionStatus::Won;
        self.selected = None;
        self.active_hint = None;

        let report = WinReport {
            level: self.level,
            elapsed_secs,
            hints_used: self.hints_used,
            score: self.score,
        };
        log::debug!("Level {} solved in {}s with score {}", self.level, elapsed_secs, self.score);
        recorder.record_win(&report);
        Ok(Outcome::Solved(report))
    }

    pub fn pause_at(&mut self, now_ms: u64) -> Result<Outcome> {
        self.check_not_finished()?;
        if self.status == SessionStatus::Paused {
            return Ok(Outcome::NoChange);
        }
        self.status = SessionStatus::Paused;
        self.paused_at = Some(now_ms);
        Ok(Outcome::Updated)
    }

    /// Resumes play; the paused interval does not count toward elapsed time.
    pub fn resume_at(&mut self, now_ms: u64) -> Result<Outcome> {
        self.check_not_finished()?;
        let Some(paused_at) = self.paused_at.filter(|_| self.status == SessionStatus::Paused) else {
            return Err(GameError::NotPaused);
        };
        self.started_at = self.started_at.saturating_add(now_ms.saturating_sub(paused_at));
        self.paused_at = None;
        self.status = SessionStatus::Playing;
        Ok(Outcome::Updated)
    }

    /// Fresh session on the same level number. Leaving an unsolved level counts as abandoned.
    pub fn reset<C: Campaign, R: StatsRecorder + ?Sized>(
        &self,
        generator: &PuzzleGenerator<C>,
        recorder: &mut R,
    ) -> Self {
        self.restart_at(self.level, generator, recorder, now_millis())
    }

    pub fn next_level<C: Campaign, R: StatsRecorder + ?Sized>(
        &self,
        generator: &PuzzleGenerator<C>,
        recorder: &mut R,
    ) -> Self {
        self.restart_at(self.level.saturating_add(1), generator, recorder, now_millis())
    }

    pub fn restart_at<C: Campaign, R: StatsRecorder + ?Sized>(
        &self,
        number: u32,
        generator: &PuzzleGenerator<C>,
        recorder: &mut R,
        now_ms: u64,
    ) -> Self {
        if !self.is_finished() {
            recorder.record_abandoned();
        }
        let level = generator.campaign_level(number, self.difficulty);
        Self::start_at(level, number, now_ms, self.rules)
    }

    /// Rebuilds the board from `placed` and swaps it in, or leaves everything as it was.
    fn commit(&mut self, placed: Vec<PlacedPiece>) -> Result<()> {
        self.board = Board::from_placements(&placed)?;
        self.placed = placed;
        Ok(())
    }

    fn after_placement(&mut self, cost: u32) {
        self.selected = None;
        self.active_hint = None;
        self.score = self.score.saturating_sub(cost);
    }

    fn pool_index(&self, piece: PieceId) -> Result<usize> {
        match self.pool.iter().position(|candidate| candidate.id == piece) {
            Some(index) => Ok(index),
            None if self.placed.iter().any(|placed| placed.id() == piece) => {
                Err(GameError::PieceNotInPool(piece))
            }
            None => Err(GameError::UnknownPiece(piece)),
        }
    }

    fn placed_index(&self, piece: PieceId) -> Result<usize> {
        match self.placed.iter().position(|placed| placed.id() == piece) {
            Some(index) => Ok(index),
            None if self.pool.iter().any(|candidate| candidate.id == piece) => {
                Err(GameError::PieceNotPlaced(piece))
            }
            None => Err(GameError::UnknownPiece(piece)),
        }
    }

    fn check_playing(&self) -> Result<()> {
        match self.status {
            SessionStatus::Playing => Ok(()),
            SessionStatus::Paused => Err(GameError::Paused),
            SessionStatus::Won => Err(GameError::AlreadyEnded),
        }
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.status.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

/// Plain field-by-field view of a session, used to persist and restore it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParts {
    pub target: Board,
    pub pool: Vec<Piece>,
    pub placed: Vec<PlacedPiece>,
    pub selected: Option<PieceId>,
    pub hints_used: u8,
    pub score: u32,
    pub level: u32,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub started_at: u64,
    pub paused_at: Option<u64>,
    pub active_hint: Option<Hint>,
    pub hint_seed: u64,
    pub rules: SessionRules,
}

impl GameSession {
    /// Validates and reassembles a session. The board is replayed from `placed`.
    pub fn from_parts(parts: SessionParts) -> Result<Self> {
        let mut seen = HashSet::new();
        let ids = parts
            .pool
            .iter()
            .map(|piece| piece.id)
            .chain(parts.placed.iter().map(PlacedPiece::id));
        for id in ids {
            if !seen.insert(id) {
                return Err(GameError::DuplicatePiece(id));
            }
        }
        if let Some(id) = parts.selected {
            if !parts.pool.iter().any(|piece| piece.id == id) {
                return Err(GameError::PieceNotInPool(id));
            }
        }
        if parts.hints_used > parts.rules.max_hints {
            return Err(GameError::HintLimitReached);
        }

        let board = Board::from_placements(&parts.placed)?;
        let paused_at = match parts.status {
            SessionStatus::Paused => Some(parts.paused_at.unwrap_or(parts.started_at)),
            SessionStatus::Playing | SessionStatus::Won => None,
        };
        Ok(Self {
            board,
            target: parts.target,
            pool: parts.pool,
            placed: parts.placed,
            selected: parts.selected,
            hints_used: parts.hints_used,
            score: parts.score,
            level: parts.level,
            difficulty: parts.difficulty,
            status: parts.status,
            started_at: parts.started_at,
            paused_at,
            active_hint: parts.active_hint,
            hint_seed: parts.hint_seed,
            rules: parts.rules,
        })
    }

    pub fn to_parts(&self) -> SessionParts {
        SessionParts::from(self.clone())
    }
}

impl TryFrom<SessionParts> for GameSession {
    type Error = GameError;

    fn try_from(parts: SessionParts) -> Result<Self> {
        Self::from_parts(parts)
    }
}

impl From<GameSession> for SessionParts {
    fn from(session: GameSession) -> Self {
        Self {
            target: session.target,
            pool: session.pool,
            placed: session.placed,
            selected: session.selected,
            hints_used: session.hints_used,
            score: session.score,
            level: session.level,
            difficulty: session.difficulty,
            status: session.status,
            started_at: session.started_at,
            paused_at: session.paused_at,
            active_hint: session.active_hint,
            hint_seed: session.hint_seed,
            rules: session.rules,
        }
    }
}
