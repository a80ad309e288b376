//! The background gesture loop and its start/stop control.
//!
//! ```text
//!   UI thread                          gesture thread
//!   ─────────                          ──────────────
//!   GestureTask::start ──spawn(Rig)──▶ open camera
//!                                      loop {
//!        ◀── Arc<Mutex<SharedStatus>> ─   read → mirror → detect → classify → dispatch
//!   GestureTask::stop ── cancel flag ─▶   (checked once per frame)
//!                                      }
//!        ◀────────── join → Rig ─────── release camera
//! ```
//!
//! The thread owns the [`Rig`] (camera factory, detector, classifier and
//! dispatcher) while it runs and hands it back when it ends, so the next
//! start reuses the same playback client and volume control.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use gesture_core::{
    ActionOutcome, Classifier, Dispatcher, Gesture, HandSnapshot, PlaybackClient, VolumeControl,
    NO_HAND_TEXT,
};

use crate::camera::{CameraFactory, CaptureError, FrameSource};
use crate::detector::{DetectorError, HandDetector};
use crate::frame::Frame;

pub type BoxedPlayback = Box<dyn PlaybackClient + Send>;
pub type BoxedVolume   = Box<dyn VolumeControl + Send>;

// ════════════════════════════════════════════════════════════════════════════
// Rig — everything the gesture thread owns while running
// ════════════════════════════════════════════════════════════════════════════

pub struct Rig {
    pub camera:     Box<dyn CameraFactory>,
    pub detector:   Box<dyn HandDetector>,
    pub classifier: Classifier,
    pub dispatcher: Dispatcher<BoxedPlayback, BoxedVolume>,
    /// Flip frames horizontally before detection (selfie view).
    pub mirror:     bool,
}

// ════════════════════════════════════════════════════════════════════════════
// SharedStatus — what the UI reads
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct SharedStatus {
    pub running:     bool,
    /// Gesture name or "No Hand Detected".
    pub overlay:     &'static str,
    pub frame:       Option<Frame>,
    pub landmarks:   Option<HandSnapshot>,
    /// Why the loop last stopped on its own.
    pub error:       Option<String>,
    pub last_action: Option<String>,
    pub frames:      u64,
}

impl Default for SharedStatus {
    fn default() -> Self {
        SharedStatus {
            running:     false,
            overlay:     NO_HAND_TEXT,
            frame:       None,
            landmarks:   None,
            error:       None,
            last_action: None,
            frames:      0,
        }
    }
}

/// A panicked holder leaves the status readable; every write is a plain
/// field assignment.
pub fn lock_status(status: &Mutex<SharedStatus>) -> MutexGuard<'_, SharedStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn describe_outcome(gesture: Gesture, outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Performed(msg) => format!("{}: {}", gesture, msg),
        ActionOutcome::Skipped(msg)   => format!("{}: {} (no-op)", gesture, msg),
        ActionOutcome::Failed(err)    => format!("{}: failed, {}", gesture, err),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run_frame_loop — one session's per-frame body
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum LoopExit {
    Cancelled,
    CaptureFailed(CaptureError),
    DetectorFailed(DetectorError),
}

/// Read, detect, classify and dispatch until `cancel` is set or a frame
/// cannot be read.  `clock` supplies the dispatcher's notion of now.
#[allow(clippy::too_many_arguments)]
pub fn run_frame_loop<P: PlaybackClient, V: VolumeControl>(
    source:     &mut dyn FrameSource,
    detector:   &mut dyn HandDetector,
    classifier: &Classifier,
    dispatcher: &mut Dispatcher<P, V>,
    mirror:     bool,
    status:     &Mutex<SharedStatus>,
    cancel:     &AtomicBool,
    mut clock:  impl FnMut() -> Instant,
) -> LoopExit {
    loop {
        if cancel.load(Ordering::SeqCst) {
            return LoopExit::Cancelled;
        }

        let mut frame = match source.read_frame() {
            Ok(f)  => f,
            Err(e) => return LoopExit::CaptureFailed(e),
        };
        if mirror {
            frame.mirror();
        }

        let hand = match detector.detect(&frame) {
            Ok(h)  => h,
            Err(e) => return LoopExit::DetectorFailed(e),
        };
        let gesture = hand.as_ref().and_then(|h| classifier.classify(h));
        let report = dispatcher.process(gesture, clock());

        let mut st = lock_status(status);
        st.overlay = report.overlay;
        st.frame = Some(frame);
        st.landmarks = hand;
        st.frames += 1;
        if let Some((g, outcome)) = &report.fired {
            st.last_action = Some(describe_outcome(*g, outcome));
        }
    }
}

fn run_session(mut rig: Rig, status: &Mutex<SharedStatus>, cancel: &AtomicBool) -> Rig {
    match rig.camera.open() {
        Err(e) => {
            log::error!("{}", e);
            lock_status(status).error = Some(e.to_string());
        }
        Ok(mut source) => {
            log::info!("gesture loop started ({}, {})", source.name(), rig.detector.name());
            let exit = run_frame_loop(
                source.as_mut(),
                rig.detector.as_mut(),
                &rig.classifier,
                &mut rig.dispatcher,
                rig.mirror,
                status,
                cancel,
                Instant::now,
            );
            drop(source);

            let error = match exit {
                LoopExit::Cancelled         => None,
                LoopExit::CaptureFailed(e)  => Some(e.to_string()),
                LoopExit::DetectorFailed(e) => Some(e.to_string()),
            };
            match &error {
                None    => log::info!("gesture loop stopped"),
                Some(e) => log::error!("gesture loop ended: {}", e),
            }
            lock_status(status).error = error;
        }
    }

    rig.dispatcher.reset();
    let mut st = lock_status(status);
    st.running = false;
    st.overlay = NO_HAND_TEXT;
    st.landmarks = None;
    drop(st);
    rig
}

// ════════════════════════════════════════════════════════════════════════════
// GestureTask — start/stop handle
// ════════════════════════════════════════════════════════════════════════════

pub struct GestureTask {
    status: Arc<Mutex<SharedStatus>>,
    cancel: Arc<AtomicBool>,
    rig:    Option<Rig>,
    worker: Option<JoinHandle<Rig>>,
}

impl GestureTask {
    pub fn new(rig: Rig) -> Self {
        GestureTask {
            status: Arc::new(Mutex::new(SharedStatus::default())),
            cancel: Arc::new(AtomicBool::new(false)),
            rig:    Some(rig),
            worker: None,
        }
    }

    pub fn status(&self) -> MutexGuard<'_, SharedStatus> { lock_status(&self.status) }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the gesture thread.  Returns false if it is already running
    /// or the rig was lost to a panic.
    pub fn start(&mut self) -> bool {
        self.reap();
        if self.worker.is_some() {
            return false;
        }
        let Some(rig) = self.rig.take() else {
            self.status().error = Some("gesture thread crashed; restart the application".into());
            return false;
        };

        self.cancel.store(false, Ordering::SeqCst);
        {
            let mut st = self.status();
            st.running = true;
            st.error = None;
            st.overlay = NO_HAND_TEXT;
        }

        let status = Arc::clone(&self.status);
        let cancel = Arc::clone(&self.cancel);
        self.worker = Some(thread::spawn(move || run_session(rig, &status, &cancel)));
        true
    }

    /// Signal the thread and wait for it to hand the rig back.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            self.join(handle);
        }
    }

    pub fn toggle(&mut self) {
        if self.is_running() { self.stop() } else { self.start(); }
    }

    /// Collect a thread that ended on its own (camera or detector failure).
    fn reap(&mut self) {
        if self.worker.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = self.worker.take() {
                self.join(handle);
            }
        }
    }

    fn join(&mut self, handle: JoinHandle<Rig>) {
        match handle.join() {
            Ok(rig) => self.rig = Some(rig),
            Err(_) => {
                log::error!("gesture thread panicked");
                let mut st = self.status();
                st.running = false;
                st.error = Some("gesture thread panicked".into());
            }
        }
    }
}

impl Drop for GestureTask {
    fn drop(&mut self) { self.stop(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraChoice, SimCamera};
    use crate::detector::{SimDetector, SimPose};
    use gesture_core::{pose, ActionError, NoVolume, PlaybackState};
    use std::collections::VecDeque;
    use std::time::Duration;

    // ── fakes ─────────────────────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<&'static str>>>);

    impl Calls {
        fn push(&self, c: &'static str) { self.0.lock().unwrap().push(c); }
        fn get(&self) -> Vec<&'static str> { self.0.lock().unwrap().clone() }
    }

    struct RecordingPlayback(Calls);

    impl PlaybackClient for RecordingPlayback {
        fn current_playback(&mut self) -> Result<Option<PlaybackState>, ActionError> {
            Ok(Some(PlaybackState::default()))
        }
        fn devices(&mut self) -> Result<Vec<String>, ActionError> { Ok(vec!["dev".into()]) }
        fn start_playback(&mut self) -> Result<(), ActionError> { self.0.push("play"); Ok(()) }
        fn pause_playback(&mut self) -> Result<(), ActionError> { self.0.push("pause"); Ok(()) }
        fn next_track(&mut self) -> Result<(), ActionError>     { self.0.push("next"); Ok(()) }
        fn previous_track(&mut self) -> Result<(), ActionError> { self.0.push("prev"); Ok(()) }
        fn save_track(&mut self, _id: &str) -> Result<(), ActionError> { self.0.push("like"); Ok(()) }
    }

    /// Yields `n` blank frames, then fails.
    struct FiniteSource(usize);

    impl FrameSource for FiniteSource {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.0 == 0 {
                return Err(CaptureError::Read("end of tape".into()));
            }
            self.0 -= 1;
            Ok(Frame::filled(4, 4, [0, 0, 0]))
        }
        fn name(&self) -> &str { "tape" }
    }

    /// Replays a fixed gesture script, one entry per frame.
    struct ScriptedDetector(VecDeque<Option<Gesture>>);

    impl HandDetector for ScriptedDetector {
        fn detect(&mut self, _f: &Frame) -> Result<Option<HandSnapshot>, DetectorError> {
            Ok(self.0.pop_front().flatten().map(pose))
        }
        fn name(&self) -> &str { "script" }
    }

    fn dispatcher(calls: &Calls) -> Dispatcher<BoxedPlayback, BoxedVolume> {
        Dispatcher::new(
            Box::new(RecordingPlayback(calls.clone())) as BoxedPlayback,
            Box::new(NoVolume::default()) as BoxedVolume,
        )
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() { return true; }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    // ── run_frame_loop ────────────────────────────────────────────────────

    #[test]
    fn loop_ends_on_read_failure_and_debounces() {
        let calls = Calls::default();
        let mut d = dispatcher(&calls);
        let status = Mutex::new(SharedStatus::default());
        let script = [Some(Gesture::PointingRight); 4].into_iter().collect();
        let t0 = Instant::now();
        let mut tick = 0u64;

        let exit = run_frame_loop(
            &mut FiniteSource(4),
            &mut ScriptedDetector(script),
            &Classifier::default(),
            &mut d,
            false,
            &status,
            &AtomicBool::new(false),
            || { tick += 1; t0 + Duration::from_millis(100 * tick) },
        );

        assert!(matches!(exit, LoopExit::CaptureFailed(CaptureError::Read(_))));
        assert_eq!(calls.get(), vec!["next"]);
        let st = lock_status(&status);
        assert_eq!(st.frames, 4);
        assert_eq!(st.overlay, "Pointing Right");
        assert_eq!(st.last_action.as_deref(), Some("Pointing Right: skipped to next track"));
    }

    #[test]
    fn cancelled_loop_reads_nothing() {
        let calls = Calls::default();
        let mut d = dispatcher(&calls);
        let status = Mutex::new(SharedStatus::default());
        let exit = run_frame_loop(
            &mut FiniteSource(10),
            &mut ScriptedDetector(VecDeque::new()),
            &Classifier::default(),
            &mut d,
            true,
            &status,
            &AtomicBool::new(true),
            Instant::now,
        );
        assert!(matches!(exit, LoopExit::Cancelled));
        assert_eq!(lock_status(&status).frames, 0);
    }

    #[test]
    fn no_hand_frames_show_no_hand_text() {
        let calls = Calls::default();
        let mut d = dispatcher(&calls);
        let status = Mutex::new(SharedStatus::default());
        run_frame_loop(
            &mut FiniteSource(2),
            &mut ScriptedDetector([None, None].into_iter().collect()),
            &Classifier::default(),
            &mut d,
            false,
            &status,
            &AtomicBool::new(false),
            Instant::now,
        );
        let st = lock_status(&status);
        assert_eq!(st.overlay, NO_HAND_TEXT);
        assert!(st.landmarks.is_none());
        assert!(calls.get().is_empty());
    }

    // ── GestureTask ───────────────────────────────────────────────────────

    fn sim_rig(calls: &Calls) -> (std::sync::mpsc::Sender<SimPose>, Rig) {
        let (tx, det) = SimDetector::channel();
        let camera = || -> Result<Box<dyn FrameSource>, CaptureError> {
            Ok(Box::new(SimCamera::new(8, 8).with_interval(Duration::from_millis(1))))
        };
        let rig = Rig {
            camera:     Box::new(camera),
            detector:   Box::new(det),
            classifier: Classifier::default(),
            dispatcher: dispatcher(calls),
            mirror:     true,
        };
        (tx, rig)
    }

    #[test]
    fn start_stop_reuses_the_same_playback_client() {
        let calls = Calls::default();
        let (tx, rig) = sim_rig(&calls);
        let mut task = GestureTask::new(rig);

        tx.send(SimPose::Hand(Gesture::PointingLeft)).unwrap();
        assert!(task.start());
        assert!(!task.start(), "already running");
        assert!(wait_until(|| calls.get().len() == 1));
        task.stop();
        assert!(!task.is_running());
        assert!(!task.status().running);

        // Fresh session: hold state was reset, so the held pose fires again
        // through the same client.
        assert!(task.start());
        assert!(wait_until(|| calls.get().len() == 2));
        task.stop();
        assert_eq!(calls.get(), vec!["prev", "prev"]);
    }

    #[test]
    fn camera_failure_reports_error_and_never_loops() {
        let calls = Calls::default();
        let rig = Rig {
            camera:     Box::new(|| -> Result<Box<dyn FrameSource>, CaptureError> {
                Err(CaptureError::Unavailable("no device".into()))
            }),
            detector:   Box::new(ScriptedDetector(VecDeque::new())),
            classifier: Classifier::default(),
            dispatcher: dispatcher(&calls),
            mirror:     false,
        };
        let mut task = GestureTask::new(rig);
        assert!(task.start());
        assert!(wait_until(|| !task.is_running()));

        let st = task.status().clone();
        assert_eq!(st.frames, 0);
        assert!(st.error.unwrap().contains("no device"));

        // The rig comes back, so the user can retry.
        assert!(task.start());
        task.stop();
    }

    #[test]
    fn toggle_flips_running_state() {
        let calls = Calls::default();
        let (_tx, rig) = sim_rig(&calls);
        let mut task = GestureTask::new(rig);
        task.toggle();
        assert!(task.is_running());
        assert!(wait_until(|| task.status().frames > 0));
        task.toggle();
        assert!(!task.is_running());
        assert_eq!(task.status().overlay, NO_HAND_TEXT);
    }

    #[test]
    fn simulated_camera_choice_runs() {
        let calls = Calls::default();
        let (_tx, mut rig) = sim_rig(&calls);
        rig.camera = Box::new(CameraChoice::Simulated { width: 16, height: 12 });
        let mut task = GestureTask::new(rig);
        task.start();
        assert!(wait_until(|| task.status().frame.as_ref().is_some_and(|f| f.width == 16)));
    }
}
