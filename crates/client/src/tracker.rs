use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use course_core::model::LessonId;
use course_core::time::format_secs;

use crate::sync::{ProgressSync, SyncError, SyncOutcome};
use crate::timer::{LessonTimer, TimerState};

/// Snapshot of the timer published after every tracker step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerView {
    pub state: TimerState,
    pub total_secs: u32,
    pub required_secs: u32,
    pub percent: u8,
    pub completed: bool,
}

impl TimerView {
    fn from_timer(timer: &LessonTimer) -> Self {
        Self {
            state: timer.state(),
            total_secs: timer.total_secs(),
            required_secs: timer.required_secs(),
            percent: timer.percent(),
            completed: timer.is_completed(),
        }
    }

    /// "M:SS / M:SS" progress line for display.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} / {}",
            format_secs(self.total_secs.min(self.required_secs)),
            format_secs(self.required_secs)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCommand {
    /// The lesson left the foreground; stop counting.
    Pause,
    Resume,
    /// The learner left the lesson; flush what is unsynced and finish.
    Stop,
}

/// Handle to a running lesson tracker task.
pub struct TrackerHandle {
    commands: mpsc::Sender<TrackerCommand>,
    view: watch::Receiver<TimerView>,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    #[must_use]
    pub fn view(&self) -> watch::Receiver<TimerView> {
        self.view.clone()
    }

    pub async fn pause(&self) {
        let _ = self.commands.send(TrackerCommand::Pause).await;
    }

    pub async fn resume(&self) {
        let _ = self.commands.send(TrackerCommand::Resume).await;
    }

    pub async fn stop(&self) {
        let _ = self.commands.send(TrackerCommand::Stop).await;
    }

    /// Wait for the tracker to finish. Dropping the handle's command side
    /// counts as a stop, so joining without an explicit stop still flushes.
    pub async fn join(self) {
        drop(self.commands);
        let _ = self.task.await;
    }
}

/// Spawn the task that ticks a lesson timer once per second and submits
/// progress at each interval.
///
/// One submission is outstanding at a time; responses settle into the timer
/// between ticks. The task ends when the server reports completion or the
/// tracker is stopped and its final flush has settled.
#[must_use]
pub fn track_lesson(
    lesson_id: LessonId,
    mut timer: LessonTimer,
    sync: Arc<dyn ProgressSync>,
) -> TrackerHandle {
    let (command_tx, mut command_rx) = mpsc::channel(8);
    let (view_tx, view_rx) = watch::channel(TimerView::from_timer(&timer));

    let task = tokio::spawn(async move {
        let (result_tx, mut result_rx) = mpsc::channel::<Result<SyncOutcome, SyncError>>(4);

        timer.resume();
        let _ = view_tx.send(TimerView::from_timer(&timer));

        let period = Duration::from_secs(1);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut commands_open = true;
        while timer.state() != TimerState::Stopped || timer.is_syncing() {
            tokio::select! {
                _ = ticker.tick() => {
                    timer.tick();
                    if timer.begin_submit().is_some() {
                        spawn_submission(lesson_id, &sync, &result_tx);
                    }
                }
                command = command_rx.recv(), if commands_open => match command {
                    Some(TrackerCommand::Pause) => timer.pause(),
                    Some(TrackerCommand::Resume) => timer.resume(),
                    Some(TrackerCommand::Stop) | None => {
                        commands_open = command.is_some();
                        timer.stop();
                        if timer.begin_flush().is_some() {
                            spawn_submission(lesson_id, &sync, &result_tx);
                        }
                    }
                },
                Some(result) = result_rx.recv() => settle(&mut timer, lesson_id, result),
            }
            let _ = view_tx.send(TimerView::from_timer(&timer));
        }
    });

    TrackerHandle {
        commands: command_tx,
        view: view_rx,
        task,
    }
}

fn spawn_submission(
    lesson_id: LessonId,
    sync: &Arc<dyn ProgressSync>,
    result_tx: &mpsc::Sender<Result<SyncOutcome, SyncError>>,
) {
    let sync = Arc::clone(sync);
    let result_tx = result_tx.clone();
    tokio::spawn(async move {
        let result = sync.submit_increment(lesson_id).await;
        let _ = result_tx.send(result).await;
    });
}

fn settle(timer: &mut LessonTimer, lesson_id: LessonId, result: Result<SyncOutcome, SyncError>) {
    match result {
        Ok(SyncOutcome::Recorded { total_secs }) => timer.settle_ok(total_secs, false),
        Ok(SyncOutcome::Completed { total_secs }) => timer.settle_ok(total_secs, true),
        Ok(SyncOutcome::AlreadyCompleted) => timer.settle_already_completed(),
        Err(err) => {
            tracing::warn!("progress submission for lesson {lesson_id} failed: {err}");
            timer.settle_failed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::LessonSnapshot;
    use async_trait::async_trait;
    use course_core::completion::SubmitPolicy;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Server double that credits a fixed interval per call, with the same
    /// ceiling rule as the real service.
    struct FakeSync {
        required_secs: u32,
        credit_secs: u32,
        total: Mutex<u32>,
        calls: AtomicU32,
    }

    impl FakeSync {
        fn new(required_secs: u32, credit_secs: u32) -> Self {
            Self::with_saved(required_secs, credit_secs, 0)
        }

        fn with_saved(required_secs: u32, credit_secs: u32, saved_secs: u32) -> Self {
            Self {
                required_secs,
                credit_secs,
                total: Mutex::new(saved_secs),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn synced_total(&self) -> u32 {
            *self.total.lock().unwrap()
        }
    }

    #[async_trait]
    impl ProgressSync for FakeSync {
        async fn submit_increment(&self, _lesson_id: LessonId) -> Result<SyncOutcome, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut total = self.total.lock().unwrap();
            if *total >= self.required_secs {
                return Ok(SyncOutcome::AlreadyCompleted);
            }
            *total = (*total + self.credit_secs).min(self.required_secs);
            Ok(if *total >= self.required_secs {
                SyncOutcome::Completed { total_secs: *total }
            } else {
                SyncOutcome::Recorded { total_secs: *total }
            })
        }

        async fn mark_complete(&self, _lesson_id: LessonId) -> Result<SyncOutcome, SyncError> {
            Ok(SyncOutcome::Completed {
                total_secs: self.required_secs,
            })
        }

        async fn lesson_snapshot(&self, _lesson_id: LessonId) -> Result<LessonSnapshot, SyncError> {
            Ok(LessonSnapshot::default())
        }
    }

    fn default_timer(required: u32) -> LessonTimer {
        LessonTimer::new(required, SubmitPolicy::default())
    }

    async fn wait_until_completed(view: &mut watch::Receiver<TimerView>) {
        tokio::time::timeout(Duration::from_secs(600), async {
            loop {
                view.changed().await.unwrap();
                if view.borrow().completed {
                    break;
                }
            }
        })
        .await
        .expect("tracker never reported completion");
    }

    #[tokio::test(start_paused = true)]
    async fn runs_a_short_lesson_to_completion() {
        let sync = Arc::new(FakeSync::new(45, 15));
        let handle = track_lesson(LessonId::new(1), default_timer(45), sync.clone());
        let mut view = handle.view();

        wait_until_completed(&mut view).await;

        assert_eq!(sync.calls(), 3);
        assert_eq!(view.borrow().total_secs, 45);
        assert_eq!(view.borrow().state, TimerState::Stopped);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_halts_accrual_and_submissions() {
        let sync = Arc::new(FakeSync::new(300, 15));
        let handle = track_lesson(LessonId::new(1), default_timer(300), sync.clone());

        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.pause().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        let total = handle.view().borrow().total_secs;
        assert!(total <= 6, "accrued {total}s after pausing around 5s");
        assert_eq!(sync.calls(), 0);

        handle.stop().await;
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_flushes_the_unsynced_tail() {
        let sync = Arc::new(FakeSync::new(300, 15));
        let handle = track_lesson(LessonId::new(1), default_timer(300), sync.clone());

        tokio::time::sleep(Duration::from_secs(8)).await;
        handle.stop().await;
        handle.join().await;

        assert_eq!(sync.calls(), 1);
        assert_eq!(sync.synced_total(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn server_already_completed_stops_the_tracker() {
        let sync = Arc::new(FakeSync::with_saved(45, 15, 45));
        let handle = track_lesson(LessonId::new(1), default_timer(45), sync.clone());
        let mut view = handle.view();

        wait_until_completed(&mut view).await;

        assert_eq!(sync.calls(), 1);
        assert_eq!(view.borrow().total_secs, 45);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn resumed_completed_lesson_never_submits() {
        let sync = Arc::new(FakeSync::new(120, 15));
        let timer = LessonTimer::resuming(120, 120, SubmitPolicy::default());
        let handle = track_lesson(LessonId::new(1), timer, sync.clone());

        handle.join().await;
        assert_eq!(sync.calls(), 0);
    }

    #[test]
    fn view_displays_minutes_and_seconds() {
        let timer = LessonTimer::resuming(300, 65, SubmitPolicy::default());
        let view = TimerView::from_timer(&timer);
        assert_eq!(view.display(), "1:05 / 5:00");
    }
}
