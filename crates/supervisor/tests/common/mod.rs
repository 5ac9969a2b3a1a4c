//! Scripted launcher and handles for exercising supervisor transitions

#![allow(dead_code)]

use async_trait::async_trait;
use child_process::{Command, Error, ExitStatus, Launcher, ProcessHandle, Result};
use nix::sys::signal::Signal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something that happened to a scripted child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Child `n` was launched
    Launch(u32),
    /// Child `n`'s group was sent SIGTERM
    Kill(u32),
    /// Child `n` was reaped
    Reap(u32),
}

#[derive(Default)]
struct Shared {
    journal: Mutex<Vec<Event>>,
    exits: Mutex<Vec<Arc<Mutex<Option<ExitStatus>>>>>,
    live: AtomicUsize,
    max_live: AtomicUsize,
    fail_launch: Mutex<bool>,
    fail_polls: Mutex<bool>,
}

/// Launcher whose children only exit when told to
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    shared: Arc<Shared>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following launch fail as if the binary were missing
    pub fn fail_launches(&self) {
        *self.shared.fail_launch.lock().unwrap() = true;
    }

    /// Make `try_wait` fail on every child while `fail` is set
    pub fn fail_polls(&self, fail: bool) {
        *self.shared.fail_polls.lock().unwrap() = fail;
    }

    /// Make child `id` exit with `code` on its own
    pub fn exit_child(&self, id: u32, code: i32) {
        let exits = self.shared.exits.lock().unwrap();
        *exits[id as usize].lock().unwrap() = Some(ExitStatus {
            code: Some(code),
            signal: None,
        });
    }

    pub fn journal(&self) -> Vec<Event> {
        self.shared.journal.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.journal().iter().filter(|e| matches(e)).count()
    }

    pub fn launches(&self) -> usize {
        self.count(|e| matches!(e, Event::Launch(_)))
    }

    /// Children alive right now
    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Most children ever alive at the same time
    pub fn max_live(&self) -> usize {
        self.shared.max_live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    type Handle = ScriptedHandle;

    async fn launch(&self, command: &Command) -> Result<Self::Handle> {
        if *self.shared.fail_launch.lock().unwrap() {
            return Err(Error::CommandNotFound {
                command: command.to_string(),
            });
        }

        let exit = Arc::new(Mutex::new(None));
        let id = {
            let mut exits = self.shared.exits.lock().unwrap();
            exits.push(Arc::clone(&exit));
            (exits.len() - 1) as u32
        };

        let live = self.shared.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_live.fetch_max(live, Ordering::SeqCst);
        self.shared.journal.lock().unwrap().push(Event::Launch(id));

        Ok(ScriptedHandle {
            id,
            exit,
            reaped: false,
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct ScriptedHandle {
    id: u32,
    exit: Arc<Mutex<Option<ExitStatus>>>,
    reaped: bool,
    shared: Arc<Shared>,
}

#[async_trait]
impl ProcessHandle for ScriptedHandle {
    fn pid(&self) -> u32 {
        1000 + self.id
    }

    fn pgid(&self) -> u32 {
        self.pid()
    }

    fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if *self.shared.fail_polls.lock().unwrap() {
            return Err(Error::WaitFailed {
                pid: self.pid(),
                reason: "scripted poll failure".into(),
            });
        }
        Ok(*self.exit.lock().unwrap())
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        assert!(!self.reaped, "child {} reaped twice", self.id);
        let status = self.exit.lock().unwrap().unwrap_or(ExitStatus {
            code: None,
            signal: Some(Signal::SIGTERM as i32),
        });
        self.reaped = true;
        self.shared.live.fetch_sub(1, Ordering::SeqCst);
        self.shared.journal.lock().unwrap().push(Event::Reap(self.id));
        Ok(status)
    }

    fn signal_group(&self, signal: Signal) -> Result<()> {
        assert!(!self.reaped, "signaled child {} after it was reaped", self.id);
        assert_eq!(signal, Signal::SIGTERM);
        self.shared.journal.lock().unwrap().push(Event::Kill(self.id));
        let mut exit = self.exit.lock().unwrap();
        if exit.is_none() {
            *exit = Some(ExitStatus {
                code: None,
                signal: Some(signal as i32),
            });
        }
        Ok(())
    }
}

/// Poll `cond` every 10ms until it holds or `timeout` elapses
pub async fn eventually(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        smol::Timer::after(Duration::from_millis(10)).await;
    }
    cond()
}
