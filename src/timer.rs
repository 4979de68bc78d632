/// Timer module for running Pomodoro sessions
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::{Configuration, Rgb};
use crate::notify::Notifier;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }

    /// Notification body sent when an interval of this phase ends.
    pub fn finished_message(self) -> &'static str {
        match self {
            Phase::Work => "Work session completed!",
            Phase::Break => "Break completed! Get back to work!",
        }
    }

    pub fn color(self, config: &Configuration) -> Rgb {
        match self {
            Phase::Work => config.work_color,
            Phase::Break => config.break_color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub phase: Phase,
    /// Counted from 1.
    pub session: u32,
    pub total_seconds: u64,
}

pub fn seconds_from_minutes(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

/// Interval lengths and session count; the next interval is derived from
/// the current one, so a run never materializes its whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    work_seconds: u64,
    break_seconds: u64,
    sessions: u32,
}

impl Plan {
    fn new(config: &Configuration) -> Self {
        Self {
            work_seconds: seconds_from_minutes(config.work_minutes),
            break_seconds: seconds_from_minutes(config.break_minutes),
            sessions: config.sessions,
        }
    }

    fn first(&self) -> Option<Interval> {
        (self.sessions > 0).then_some(Interval {
            phase: Phase::Work,
            session: 1,
            total_seconds: self.work_seconds,
        })
    }

    // A break follows every work interval except the last one.
    fn after(&self, interval: &Interval) -> Option<Interval> {
        match interval.phase {
            Phase::Work if interval.session < self.sessions => Some(Interval {
                phase: Phase::Break,
                session: interval.session,
                total_seconds: self.break_seconds,
            }),
            Phase::Work => None,
            Phase::Break => Some(Interval {
                phase: Phase::Work,
                session: interval.session + 1,
                total_seconds: self.work_seconds,
            }),
        }
    }
}

/// Lazily yields work intervals for every session, with a break after each
/// but the last.
pub fn schedule(config: &Configuration) -> impl Iterator<Item = Interval> {
    let plan = Plan::new(config);
    std::iter::successors(plan.first(), move |interval| plan.after(interval))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running { interval: Interval, elapsed: u64 },
    Completed,
}

/// Second-by-second position within a run.
#[derive(Debug, Clone)]
pub struct Countdown {
    plan: Plan,
    current: Option<Interval>,
    elapsed: u64,
}

impl Countdown {
    pub fn new(config: &Configuration) -> Self {
        let plan = Plan::new(config);
        Self {
            plan,
            current: plan.first(),
            elapsed: 0,
        }
    }

    pub fn state(&self) -> State {
        match self.current {
            Some(interval) => State::Running {
                interval,
                elapsed: self.elapsed,
            },
            None => State::Completed,
        }
    }

    /// Counts one elapsed second. Returns the interval it finished, if any.
    pub fn tick(&mut self) -> Option<Interval> {
        let interval = self.current?;
        self.elapsed += 1;
        if self.elapsed < interval.total_seconds {
            return None;
        }
        self.current = self.plan.after(&interval);
        self.elapsed = 0;
        Some(interval)
    }
}

/// One tick per wall-clock second. Drift from drawing is not compensated.
pub fn wait_one_second() {
    thread::sleep(Duration::from_secs(1));
}

pub struct TimerLoop<W, N> {
    out: W,
    notifier: N,
    wait: Box<dyn FnMut()>,
    columns: fn() -> u16,
}

impl<W: Write, N: Notifier> TimerLoop<W, N> {
    /// `wait` blocks until the next tick is due; `columns` reports the
    /// terminal width for each frame.
    pub fn new(out: W, notifier: N, wait: impl FnMut() + 'static, columns: fn() -> u16) -> Self {
        Self {
            out,
            notifier,
            wait: Box::new(wait),
            columns,
        }
    }

    /// Runs every interval of `config` to completion.
    pub fn run(&mut self, config: &Configuration) -> io::Result<()> {
        let mut countdown = Countdown::new(config);

        while let State::Running { interval, elapsed } = countdown.state() {
            if elapsed == 0 {
                debug!(
                    "session {}: {} for {}s",
                    interval.session,
                    interval.phase.label(),
                    interval.total_seconds
                );
            }

            render::draw(&mut self.out, &interval, elapsed, config, (self.columns)())?;
            (self.wait)();

            if let Some(finished) = countdown.tick() {
                self.notifier.notify(finished.phase.finished_message());
            }
        }

        write!(self.out, "\nAll sessions completed! Well done!\n")?;
        self.out.flush()
    }
}
