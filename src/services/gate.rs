// src/services/gate.rs

//! Change gate: remembers the last rendered record.
//!
//! The state is a single slot. A caller takes the lock for the whole
//! invocation, so two overlapping runs can never both see a stale record and
//! render it twice.

use std::path::PathBuf;

use tokio::sync::{Mutex, MutexGuard};

/// Outcome of comparing a record against the last rendered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    New,
    Duplicate,
}

/// Last record that produced a card and where that card lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateState {
    pub last_raw_line: Option<String>,
    pub last_image: Option<PathBuf>,
}

/// Owned, injectable change gate.
#[derive(Debug, Default)]
pub struct ChangeGate {
    state: Mutex<GateState>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known state, e.g. after a restart.
    pub fn with_state(state: GateState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Take exclusive access until the returned guard is dropped.
    pub async fn lock(&self) -> GateGuard<'_> {
        GateGuard {
            state: self.state.lock().await,
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> GateState {
        self.state.lock().await.clone()
    }
}

/// Exclusive handle on the gate state.
pub struct GateGuard<'a> {
    state: MutexGuard<'a, GateState>,
}

impl GateGuard<'_> {
    /// Compare a raw line byte-for-byte with the last rendered one.
    pub fn check(&self, raw_line: &str) -> GateDecision {
        match &self.state.last_raw_line {
            Some(last) if last == raw_line => GateDecision::Duplicate,
            _ => GateDecision::New,
        }
    }

    /// Record a rendered card, returning the card it replaces.
    ///
    /// Both fields change in one assignment.
    pub fn commit(&mut self, raw_line: String, image: PathBuf) -> Option<PathBuf> {
        let previous = std::mem::replace(
            &mut *self.state,
            GateState {
                last_raw_line: Some(raw_line),
                last_image: Some(image),
            },
        );
        previous.last_image
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }
}
