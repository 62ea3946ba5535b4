//! Observable state for the presentation layer. Each store owns one state
//! value behind a `watch` channel; every mutation bumps the revision and wakes
//! all listeners.

use chrono::{Local, TimeZone};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::{Category, Memory};
use crate::views::{self, CategoryGroup, MonthGroup};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub memories: Vec<Memory>,
    pub revision: u64,
}

impl MemoryState {
    pub fn count(&self) -> usize {
        self.memories.len()
    }

    pub fn get(&self, id: &str) -> Option<&Memory> {
        self.memories.iter().find(|memory| memory.id == id)
    }

    pub fn categories(&self) -> Vec<Category> {
        views::categories(&self.memories)
    }

    pub fn by_category(&self) -> Vec<CategoryGroup> {
        views::group_by_category(&self.memories)
    }

    /// Timeline sections in the machine's local time zone
    pub fn by_month(&self) -> Vec<MonthGroup> {
        views::group_by_month(&self.memories, &Local)
    }

    pub fn by_month_in<Tz: TimeZone>(&self, zone: &Tz) -> Vec<MonthGroup>
    where
        Tz::Offset: Display,
    {
        views::group_by_month(&self.memories, zone)
    }

    pub fn favorites(&self) -> Vec<Memory> {
        views::favorites(&self.memories)
    }
}

/// Local cache of the active user's memories
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<watch::Sender<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(MemoryState::default());
        MemoryStore {
            state: Arc::new(state),
        }
    }

    /// Registers a listener; it sees the current state and every change after
    pub fn subscribe(&self) -> watch::Receiver<MemoryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.borrow().clone()
    }

    pub fn get(&self, id: &str) -> Option<Memory> {
        self.state.borrow().get(id).cloned()
    }

    /// Replaces the whole list, as every live snapshot does
    pub fn replace(&self, memories: Vec<Memory>) {
        self.state.send_modify(|state| {
            state.memories = memories;
            state.revision += 1;
        });
    }

    /// Inserts or replaces by id
    pub fn upsert(&self, memory: Memory) {
        self.state.send_modify(|state| {
            match state.memories.iter_mut().find(|m| m.id == memory.id) {
                Some(existing) => *existing = memory,
                None => state.memories.push(memory),
            }
            state.revision += 1;
        });
    }

    pub fn remove(&self, id: &str) -> Option<Memory> {
        let mut removed = None;
        self.state.send_modify(|state| {
            if let Some(index) = state.memories.iter().position(|m| m.id == id) {
                removed = Some(state.memories.remove(index));
                state.revision += 1;
            }
        });
        removed
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }
}
