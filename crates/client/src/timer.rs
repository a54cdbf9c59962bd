use course_core::completion::SubmitPolicy;

/// Play state of a lesson timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Paused,
    /// Terminal. Entered on completion or when the learner leaves the lesson.
    Stopped,
}

/// Client-side watch timer for one timed lesson.
///
/// The timer counts whole-second ticks fed to it by a driver and never
/// reports an elapsed amount to the server; a submission is a bare "credit
/// one interval" request. Ticked time moves through three buckets: not yet
/// submitted, carried by the one outstanding submission, and confirmed by
/// the server. Whatever total the server replies with is adopted as truth.
#[derive(Debug, Clone)]
pub struct LessonTimer {
    required_secs: u32,
    confirmed_secs: u32,
    unsynced_secs: u32,
    in_flight_secs: Option<u32>,
    completed: bool,
    state: TimerState,
    policy: SubmitPolicy,
}

impl LessonTimer {
    /// Timer for a lesson the learner has not started. Begins paused.
    #[must_use]
    pub fn new(required_secs: u32, policy: SubmitPolicy) -> Self {
        Self::resuming(required_secs, 0, policy)
    }

    /// Timer seeded with the server's saved total, for reopening a lesson.
    ///
    /// A saved total at or past the requirement yields a timer that is
    /// already stopped and completed.
    #[must_use]
    pub fn resuming(required_secs: u32, saved_secs: u32, policy: SubmitPolicy) -> Self {
        let confirmed_secs = saved_secs.min(required_secs);
        let completed = required_secs > 0 && confirmed_secs >= required_secs;
        Self {
            required_secs,
            confirmed_secs,
            unsynced_secs: 0,
            in_flight_secs: None,
            completed,
            state: if completed {
                TimerState::Stopped
            } else {
                TimerState::Paused
            },
            policy,
        }
    }

    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    /// Count one elapsed second. Ignored unless running, and once the
    /// requirement is reached there is nothing further to count.
    pub fn tick(&mut self) {
        if self.state != TimerState::Running || self.remaining_secs() == 0 {
            return;
        }
        self.unsynced_secs = self.unsynced_secs.saturating_add(1);
    }

    /// Whether enough unsynced time has built up for a submission.
    ///
    /// Fires every submit interval, plus once more for the short tail that
    /// lands the total exactly on the requirement. Never fires while another
    /// submission is outstanding.
    #[must_use]
    pub fn should_submit(&self) -> bool {
        if self.completed || self.in_flight_secs.is_some() || self.unsynced_secs == 0 {
            return false;
        }
        self.unsynced_secs >= self.policy.submit_interval_secs || self.remaining_secs() == 0
    }

    /// Move one interval of unsynced time into the outstanding submission.
    pub fn begin_submit(&mut self) -> Option<u32> {
        if !self.should_submit() {
            return None;
        }
        let chunk = self.unsynced_secs.min(self.policy.submit_interval_secs);
        self.unsynced_secs -= chunk;
        self.in_flight_secs = Some(chunk);
        Some(chunk)
    }

    /// Move all remaining unsynced time into a final submission, used when
    /// the learner leaves the lesson.
    pub fn begin_flush(&mut self) -> Option<u32> {
        if self.completed || self.in_flight_secs.is_some() || self.unsynced_secs == 0 {
            return None;
        }
        let chunk = std::mem::take(&mut self.unsynced_secs);
        self.in_flight_secs = Some(chunk);
        Some(chunk)
    }

    /// Adopt the server's reply to the outstanding submission.
    pub fn settle_ok(&mut self, server_total_secs: u32, server_completed: bool) {
        self.in_flight_secs = None;
        self.confirmed_secs = server_total_secs.min(self.required_secs);
        if server_completed {
            self.completed = true;
            self.unsynced_secs = 0;
            self.state = TimerState::Stopped;
        }
    }

    /// The server already holds a completed record. Stop submitting.
    pub fn settle_already_completed(&mut self) {
        self.in_flight_secs = None;
        self.confirmed_secs = self.required_secs;
        self.completed = true;
        self.unsynced_secs = 0;
        self.state = TimerState::Stopped;
    }

    /// Return the outstanding chunk to the unsynced bucket after a failed
    /// submission so it is retried on a later interval.
    pub fn settle_failed(&mut self) {
        let chunk = self.in_flight_secs.take().unwrap_or(0);
        self.unsynced_secs = self.unsynced_secs.saturating_add(chunk);
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.in_flight_secs.is_some()
    }

    #[must_use]
    pub fn required_secs(&self) -> u32 {
        self.required_secs
    }

    /// Best local estimate of the credited total, across all three buckets.
    #[must_use]
    pub fn total_secs(&self) -> u32 {
        self.confirmed_secs
            .saturating_add(self.in_flight_secs.unwrap_or(0))
            .saturating_add(self.unsynced_secs)
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.required_secs.saturating_sub(self.total_secs())
    }

    /// Whole-percent progress, rounded up so any progress shows as at
    /// least 1%.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.required_secs == 0 {
            return 100;
        }
        let total = u64::from(self.total_secs().min(self.required_secs));
        let percent = (total * 100).div_ceil(u64::from(self.required_secs));
        u8::try_from(percent).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(required: u32) -> LessonTimer {
        LessonTimer::new(required, SubmitPolicy::default())
    }

    fn run_ticks(t: &mut LessonTimer, n: u32) {
        for _ in 0..n {
            t.tick();
        }
    }

    #[test]
    fn new_timer_is_paused_and_empty() {
        let t = timer(120);
        assert_eq!(t.state(), TimerState::Paused);
        assert_eq!(t.total_secs(), 0);
        assert!(!t.should_submit());
    }

    #[test]
    fn ticks_accrue_only_while_running() {
        let mut t = timer(120);
        t.tick();
        assert_eq!(t.total_secs(), 0);

        t.resume();
        run_ticks(&mut t, 5);
        assert_eq!(t.total_secs(), 5);

        t.pause();
        run_ticks(&mut t, 5);
        assert_eq!(t.total_secs(), 5);
    }

    #[test]
    fn ticks_stop_at_the_required_duration() {
        let mut t = timer(10);
        t.resume();
        run_ticks(&mut t, 25);
        assert_eq!(t.total_secs(), 10);
        assert_eq!(t.remaining_secs(), 0);
    }

    #[test]
    fn submission_fires_once_per_interval() {
        let mut t = timer(120);
        t.resume();
        run_ticks(&mut t, 14);
        assert!(!t.should_submit());

        t.tick();
        assert!(t.should_submit());
        assert_eq!(t.begin_submit(), Some(15));

        // more time accrues while the request is outstanding, but no second
        // submission starts until the first settles
        run_ticks(&mut t, 20);
        assert!(!t.should_submit());
        assert_eq!(t.begin_submit(), None);

        t.settle_ok(15, false);
        assert!(t.should_submit());
    }

    #[test]
    fn failed_submission_returns_its_chunk() {
        let mut t = timer(120);
        t.resume();
        run_ticks(&mut t, 15);
        t.begin_submit();
        assert_eq!(t.total_secs(), 15);

        t.settle_failed();
        assert_eq!(t.total_secs(), 15);
        assert!(t.should_submit());
    }

    #[test]
    fn server_reply_becomes_the_confirmed_total() {
        let mut t = timer(120);
        t.resume();
        run_ticks(&mut t, 15);
        t.begin_submit();

        // server had prior state this client never saw
        t.settle_ok(60, false);
        assert_eq!(t.total_secs(), 60);
        assert!(!t.is_completed());
    }

    #[test]
    fn completion_reply_stops_the_timer() {
        let mut t = timer(120);
        t.resume();
        run_ticks(&mut t, 15);
        t.begin_submit();

        t.settle_ok(120, true);
        assert!(t.is_completed());
        assert_eq!(t.state(), TimerState::Stopped);
        assert_eq!(t.percent(), 100);

        t.tick();
        assert_eq!(t.total_secs(), 120);
    }

    #[test]
    fn short_final_chunk_submits_when_requirement_is_reached() {
        let mut t = timer(20);
        t.resume();
        run_ticks(&mut t, 20);

        assert_eq!(t.begin_submit(), Some(15));
        t.settle_ok(15, false);

        // 5 unsynced seconds left, under the interval, but the requirement
        // is reached so they go out anyway
        assert!(t.should_submit());
        assert_eq!(t.begin_submit(), Some(5));
        t.settle_ok(20, true);
        assert!(t.is_completed());
    }

    #[test]
    fn flush_takes_everything_unsynced() {
        let mut t = timer(300);
        t.resume();
        run_ticks(&mut t, 8);
        t.stop();

        assert_eq!(t.begin_flush(), Some(8));
        assert_eq!(t.begin_flush(), None);
    }

    #[test]
    fn resuming_at_the_requirement_is_already_stopped() {
        let t = LessonTimer::resuming(120, 120, SubmitPolicy::default());
        assert!(t.is_completed());
        assert_eq!(t.state(), TimerState::Stopped);
        assert_eq!(t.percent(), 100);
    }

    #[test]
    fn percent_rounds_up() {
        let mut t = LessonTimer::resuming(300, 0, SubmitPolicy::default());
        t.resume();
        t.tick();
        assert_eq!(t.percent(), 1);
    }

    #[test]
    fn zero_requirement_never_accrues_or_submits() {
        // Untimed lessons are completed by an explicit mark; a timer built
        // for one has nothing to count.
        let mut t = timer(0);
        t.resume();
        run_ticks(&mut t, 30);
        assert_eq!(t.total_secs(), 0);
        assert!(!t.should_submit());
        assert_eq!(t.begin_flush(), None);
    }
}
