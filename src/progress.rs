// src/progress.rs

//! Live status output.
//!
//! A `Progress` handle is created once in `main.rs` and passed to every
//! component that wants to show a spinner. At most one spinner is live at a
//! time; the logging writer calls [`Progress::suspend`] so log lines never get
//! mixed into the spinner line.

use std::borrow::Cow;
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone)]
pub struct Progress {
    enabled: bool,
    active: Arc<Mutex<Option<ProgressBar>>>,
}

impl Progress {
    /// Spinners are shown only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            enabled: std::io::stderr().is_terminal(),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// A handle that never draws anything.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a spinner with the given message, replacing any live one.
    ///
    /// The spinner is cleared when the returned guard is dropped.
    pub fn spinner(&self, message: impl Into<Cow<'static, str>>) -> Spinner {
        let bar = if self.enabled {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(message);

        let mut slot = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(bar.clone()) {
            previous.finish_and_clear();
        }

        Spinner {
            bar,
            slot: Arc::clone(&self.active),
        }
    }

    /// Run `f` with the live spinner (if any) hidden, then redraw it.
    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let bar = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for a live spinner.
#[derive(Debug)]
pub struct Spinner {
    bar: ProgressBar,
    slot: Arc<Mutex<Option<ProgressBar>>>,
}

impl Spinner {
    pub fn set_message(&self, message: impl Into<Cow<'static, str>>) {
        self.bar.set_message(message);
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        // Only clear the slot if a newer spinner hasn't taken it over.
        if slot.as_ref().is_some_and(|b| b.is_finished()) {
            *slot = None;
        }
    }
}
