use std::sync::Arc;

use crate::assets::bitmap::ImageDecoder;
use crate::assets::video::VideoEntity;
use crate::foundation::error::{SvgaError, SvgaResult};
use crate::player::events::{EventKind, EventRegistry, PlayerEvent};
use crate::player::loader::{LoadPoll, PendingLoad};
use crate::player::state::{Direction, FillMode, PlaybackState, PlayerOptions, PlayerState};
use crate::player::tick::{ClockTickSource, TickSource};
use crate::render::renderer::Renderer;
use crate::render::surface::Surface;

/// Frame-driven playback state machine.
///
/// `Idle -> Stopped -> Playing <-> Paused`; `stop`/`clear` return to `Stopped`; `destroy` is
/// terminal. Ticks are pulled from the [`TickSource`] by [`Player::pump`], which the host calls
/// from its event loop.
pub struct Player<S: Surface, T: TickSource = ClockTickSource> {
    surface: S,
    ticks: T,
    subscribed: bool,
    renderer: Renderer,
    video: Option<VideoEntity>,
    options: PlayerOptions,
    state: PlayerState,
    clamp_on_tick: bool,
    events: EventRegistry,
    pending: Option<PendingLoad>,
}

impl<S: Surface> Player<S, ClockTickSource> {
    /// Player driven by the wall clock.
    pub fn new(surface: S) -> Self {
        Self::with_tick_source(surface, ClockTickSource::new())
    }
}

impl<S: Surface, T: TickSource> Player<S, T> {
    pub fn with_tick_source(surface: S, ticks: T) -> Self {
        Self {
            surface,
            ticks,
            subscribed: false,
            renderer: Renderer::new(),
            video: None,
            options: PlayerOptions::default(),
            state: PlayerState::default(),
            clamp_on_tick: false,
            events: EventRegistry::default(),
            pending: None,
        }
    }

    /// Register a listener for one event kind.
    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&PlayerEvent) + 'static,
    ) -> SvgaResult<()> {
        self.ensure_alive()?;
        self.events.on(kind, Box::new(listener));
        Ok(())
    }

    /// Attach a built movie. Only valid while idle or stopped.
    pub fn mount(&mut self, video: VideoEntity) -> SvgaResult<()> {
        self.ensure_alive()?;
        if matches!(
            self.state.playback,
            PlaybackState::Playing | PlaybackState::Paused
        ) {
            return Err(SvgaError::invalid_state(format!(
                "cannot mount while {:?}",
                self.state.playback
            )));
        }
        self.state = PlayerState::mounted(&self.options, video.frame_count());
        self.clamp_on_tick = false;
        self.renderer.clear_cache();
        tracing::debug!(
            frames = video.frame_count(),
            fps = video.fps(),
            start = self.state.start_frame,
            end = self.state.end_frame,
            "mounted"
        );
        self.video = Some(video);
        Ok(())
    }

    /// Replace the playback options.
    pub fn configure(&mut self, options: PlayerOptions) -> SvgaResult<()> {
        self.ensure_alive()?;
        options.validate()?;
        if let Some(video) = self.video.as_ref() {
            self.state.apply_range(&options, video.frame_count());
            if self.state.playback == PlaybackState::Playing {
                self.clamp_on_tick = true;
            } else {
                self.state.clamp_current();
            }
        }
        self.options = options;
        Ok(())
    }

    /// Begin or resume playback.
    pub fn start(&mut self) -> SvgaResult<()> {
        self.ensure_alive()?;
        let fps = self.video.as_ref().ok_or(SvgaError::NotMounted)?.fps();
        match self.state.playback {
            PlaybackState::Playing => return Ok(()),
            PlaybackState::Paused => {
                self.open_ticks(fps);
                self.state.playback = PlaybackState::Playing;
                tracing::debug!(frame = self.state.current_frame, "resumed");
                return Ok(());
            }
            _ => {}
        }

        self.state.apply_run_options(&self.options);
        self.state.loops_done = 0;
        if self.state.ended {
            self.state.current_frame = self.state.run_first();
            self.state.ended = false;
        }
        self.state.clamp_current();
        self.clamp_on_tick = false;

        self.open_ticks(fps);
        self.state.playback = PlaybackState::Playing;
        tracing::debug!(frame = self.state.current_frame, loops = self.state.loops, "started");
        self.events.emit(PlayerEvent::Start);
        self.render_current();
        Ok(())
    }

    pub fn pause(&mut self) -> SvgaResult<()> {
        self.ensure_alive()?;
        self.ensure_mounted()?;
        if self.state.playback != PlaybackState::Playing {
            return Ok(());
        }
        self.close_ticks();
        self.state.playback = PlaybackState::Paused;
        tracing::debug!(frame = self.state.current_frame, "paused");
        self.events.emit(PlayerEvent::Pause);
        Ok(())
    }

    /// Stop without moving the current frame.
    pub fn stop(&mut self) -> SvgaResult<()> {
        self.ensure_alive()?;
        self.ensure_mounted()?;
        self.close_ticks();
        self.state.playback = PlaybackState::Stopped;
        tracing::debug!(frame = self.state.current_frame, "stopped");
        self.events.emit(PlayerEvent::Stop);
        Ok(())
    }

    /// Stop, erase the surface and reset playback to the start of the range. The mounted movie
    /// is kept.
    pub fn clear(&mut self) -> SvgaResult<()> {
        self.ensure_alive()?;
        self.close_ticks();
        if let Some(video) = self.video.as_ref() {
            self.state = PlayerState::mounted(&self.options, video.frame_count());
        }
        self.clamp_on_tick = false;
        self.renderer.erase(&mut self.surface);
        tracing::debug!("cleared");
        self.events.emit(PlayerEvent::Clear);
        Ok(())
    }

    /// Release everything. Idempotent; later calls fail with [`SvgaError::Destroyed`].
    pub fn destroy(&mut self) {
        if self.state.playback == PlaybackState::Destroyed {
            return;
        }
        self.close_ticks();
        self.pending = None;
        self.video = None;
        self.events.clear();
        self.renderer = Renderer::new();
        self.renderer.erase(&mut self.surface);
        self.state = PlayerState {
            playback: PlaybackState::Destroyed,
            ..PlayerState::default()
        };
        tracing::debug!("destroyed");
    }

    /// Decode and build `bytes` on a worker thread; the result is mounted by a later
    /// [`Player::pump`]. A load already in flight is abandoned.
    pub fn load(
        &mut self,
        bytes: impl Into<Vec<u8>>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> SvgaResult<()> {
        self.ensure_alive()?;
        self.pending = Some(PendingLoad::spawn(bytes.into(), decoder)?);
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Block until the in-flight load finishes and mount it. Returns `false` if nothing was
    /// loading.
    pub fn wait_for_load(&mut self) -> SvgaResult<bool> {
        self.ensure_alive()?;
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        let video = pending.wait()?;
        self.mount_loaded(video)?;
        Ok(true)
    }

    /// Apply a finished load, then run every due tick. Returns the number of ticks processed.
    pub fn pump(&mut self) -> SvgaResult<u32> {
        self.ensure_alive()?;
        self.poll_load()?;

        if !self.subscribed {
            return Ok(0);
        }
        let due = self.ticks.due();
        let mut ran = 0;
        for _ in 0..due {
            if !self.subscribed {
                break;
            }
            self.tick();
            ran += 1;
        }
        Ok(ran)
    }

    /// `current_frame / (frame_count - 1)`, or 0 for single-frame and unmounted players.
    pub fn progress(&self) -> f64 {
        let Some(video) = self.video.as_ref() else {
            return 0.0;
        };
        let last = video.movie().last_frame();
        if last == 0 {
            return 0.0;
        }
        f64::from(self.state.current_frame) / f64::from(last)
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn playback(&self) -> PlaybackState {
        self.state.playback
    }

    pub fn current_frame(&self) -> u32 {
        self.state.current_frame
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub fn video(&self) -> Option<&VideoEntity> {
        self.video.as_ref()
    }

    /// Mutable access for editing images, dynamic elements and hidden keys.
    pub fn video_mut(&mut self) -> Option<&mut VideoEntity> {
        self.video.as_mut()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn tick_source(&self) -> &T {
        &self.ticks
    }

    fn ensure_alive(&self) -> SvgaResult<()> {
        if self.state.playback == PlaybackState::Destroyed {
            return Err(SvgaError::Destroyed);
        }
        Ok(())
    }

    fn ensure_mounted(&self) -> SvgaResult<()> {
        if self.video.is_none() {
            return Err(SvgaError::NotMounted);
        }
        Ok(())
    }

    fn poll_load(&mut self) -> SvgaResult<()> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(());
        };
        match pending.poll() {
            LoadPoll::Pending => Ok(()),
            LoadPoll::Ready(res) => {
                self.pending = None;
                self.mount_loaded(res?)
            }
        }
    }

    fn mount_loaded(&mut self, video: VideoEntity) -> SvgaResult<()> {
        if matches!(
            self.state.playback,
            PlaybackState::Playing | PlaybackState::Paused
        ) {
            self.stop()?;
        }
        self.mount(video)
    }

    fn open_ticks(&mut self, fps: u32) {
        if !self.subscribed {
            self.ticks.open(fps);
            self.subscribed = true;
        }
    }

    fn close_ticks(&mut self) {
        if self.subscribed {
            self.ticks.close();
            self.subscribed = false;
        }
    }

    fn tick(&mut self) {
        if self.video.is_none() {
            return;
        }
        if std::mem::take(&mut self.clamp_on_tick) {
            self.state.clamp_current();
        }

        let next = i64::from(self.state.current_frame) + self.state.direction.step();
        let past_end = match self.state.direction {
            Direction::Forward => next > i64::from(self.state.end_frame),
            Direction::Reverse => next < i64::from(self.state.start_frame),
        };
        if !past_end {
            // In range, so it fits in u32.
            self.state.current_frame = next as u32;
            self.emit_process();
            self.render_current();
            return;
        }

        let loops = self.state.loops;
        if loops == 0 || self.state.loops_done < loops - 1 {
            self.state.loops_done += 1;
            self.state.current_frame = self.state.run_first();
            tracing::trace!(loops_done = self.state.loops_done, "loop");
            self.emit_process();
            self.render_current();
            return;
        }

        self.close_ticks();
        self.state.playback = PlaybackState::Stopped;
        self.state.ended = true;
        self.state.current_frame = match self.state.fill_mode {
            FillMode::Forwards => self.state.run_last(),
            FillMode::Backwards => self.state.run_first(),
        };
        self.emit_process();
        self.render_current();
        tracing::debug!(frame = self.state.current_frame, "ended");
        self.events.emit(PlayerEvent::End);
    }

    fn emit_process(&mut self) {
        let event = PlayerEvent::Process {
            frame: self.state.current_frame,
            progress: self.progress(),
        };
        self.events.emit(event);
    }

    fn render_current(&mut self) {
        let Some(video) = self.video.as_ref() else {
            return;
        };
        let frame = self.state.current_frame;
        if let Err(e) = self.renderer.render(video, frame, &mut self.surface) {
            tracing::warn!(frame, error = %e, "frame render failed; playback continues");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/player/scheduler.rs"]
mod tests;
