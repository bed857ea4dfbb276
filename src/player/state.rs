use crate::foundation::error::{SvgaError, SvgaResult};

/// Where playback rests after the final loop ends.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Hold the run's last frame.
    #[default]
    Forwards,
    /// Snap back to the run's first frame.
    Backwards,
}

/// Order frames are stepped in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub(crate) fn step(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }
}

/// Coarse lifecycle of a [`crate::Player`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing mounted yet.
    #[default]
    Idle,
    /// Mounted and stopped.
    Stopped,
    Playing,
    Paused,
    /// Terminal.
    Destroyed,
}

/// Playback configuration.
///
/// Loops, fill mode and direction take effect on the next start from stopped. Range changes apply
/// immediately.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerOptions {
    /// Number of times to play the range; 0 loops forever.
    pub loops: u32,
    pub fill_mode: FillMode,
    /// First frame of the range (inclusive); `None` is frame 0.
    pub start_frame: Option<u32>,
    /// Last frame of the range (inclusive); `None` is the movie's last frame.
    pub end_frame: Option<u32>,
    pub direction: Direction,
}

impl PlayerOptions {
    pub fn validate(&self) -> SvgaResult<()> {
        if let (Some(start), Some(end)) = (self.start_frame, self.end_frame)
            && start > end
        {
            return Err(SvgaError::invalid_state(format!(
                "start_frame {start} is after end_frame {end}"
            )));
        }
        Ok(())
    }

    /// Inclusive `[start, end]` range clamped to a movie with `frame_count` frames.
    pub fn resolve_range(&self, frame_count: u32) -> (u32, u32) {
        let last = frame_count.saturating_sub(1);
        let start = self.start_frame.unwrap_or(0).min(last);
        let end = self.end_frame.unwrap_or(last).min(last).max(start);
        (start, end)
    }
}

/// Snapshot of the scheduler's bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PlayerState {
    pub current_frame: u32,
    pub playback: PlaybackState,
    pub loops_done: u32,
    /// Loop target for the current run; 0 is infinite.
    pub loops: u32,
    pub start_frame: u32,
    pub end_frame: u32,
    pub fill_mode: FillMode,
    pub direction: Direction,
    /// The last run reached its end.
    #[serde(skip)]
    pub(crate) ended: bool,
}

impl PlayerState {
    /// Frame a run starts from.
    pub fn run_first(&self) -> u32 {
        match self.direction {
            Direction::Forward => self.start_frame,
            Direction::Reverse => self.end_frame,
        }
    }

    /// Frame a run finishes on.
    pub fn run_last(&self) -> u32 {
        match self.direction {
            Direction::Forward => self.end_frame,
            Direction::Reverse => self.start_frame,
        }
    }

    pub(crate) fn apply_range(&mut self, options: &PlayerOptions, frame_count: u32) {
        let (start, end) = options.resolve_range(frame_count);
        self.start_frame = start;
        self.end_frame = end;
    }

    /// Pull `current_frame` back inside `[start_frame, end_frame]`.
    pub(crate) fn clamp_current(&mut self) {
        self.current_frame = self.current_frame.clamp(self.start_frame, self.end_frame);
    }

    pub(crate) fn apply_run_options(&mut self, options: &PlayerOptions) {
        self.loops = options.loops;
        self.fill_mode = options.fill_mode;
        self.direction = options.direction;
    }

    /// Fresh state for a newly mounted movie.
    pub(crate) fn mounted(options: &PlayerOptions, frame_count: u32) -> Self {
        let mut s = Self {
            playback: PlaybackState::Stopped,
            ..Self::default()
        };
        s.apply_range(options, frame_count);
        s.apply_run_options(options);
        s.current_frame = s.run_first();
        s
    }
}
