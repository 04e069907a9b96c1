// Bounded linear undo/redo for recolor operations.
//
// One fill = one batch of entries (one per recolored pixel or shape).
// A new fill wipes the redo stack; there are no branching timelines.
use std::collections::VecDeque;

use log::{debug, info};

use crate::color::Rgb;
use crate::select::ColorTarget;

pub const MAX_HISTORY: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry<H> {
    pub target: H,
    pub old_color: Rgb,
    pub new_color: Rgb,
}

pub type Batch<H> = Vec<HistoryEntry<H>>;

#[derive(Clone, Debug)]
pub struct History<H> {
    undo: VecDeque<Batch<H>>,
    redo: VecDeque<Batch<H>>,
    max_depth: usize,
}

impl<H> Default for History<H> {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl<H> History<H> {
    /// A depth of 0 is treated as 1.
    pub fn new(max_depth: usize) -> Self {
        Self { undo: VecDeque::new(), redo: VecDeque::new(), max_depth: max_depth.max(1) }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_bounded(stack: &mut VecDeque<Batch<H>>, batch: Batch<H>, max_depth: usize) {
        stack.push_back(batch);
        while stack.len() > max_depth {
            stack.pop_front(); // oldest goes first
        }
    }
}

impl<H: Clone + PartialEq> History<H> {
    /// Recolor `members` and record what they were. Members without a color
    /// (gone, transparent, `none`) are skipped. Returns the recorded batch;
    /// an empty batch leaves the history untouched.
    pub fn commit_fill<T>(&mut self, target: &mut T, members: &[H], color: Rgb) -> Batch<H>
    where
        T: ColorTarget<Handle = H> + ?Sized,
    {
        let mut batch = Vec::with_capacity(members.len());
        for handle in members {
            if let Some(old_color) = target.color_of(handle) {
                batch.push(HistoryEntry { target: handle.clone(), old_color, new_color: color });
            }
        }
        if batch.is_empty() {
            return batch;
        }

        for entry in &batch {
            target.set_color(&entry.target, color);
        }
        Self::push_bounded(&mut self.undo, batch.clone(), self.max_depth);
        self.redo.clear();
        info!("filled {} element(s) with {color}; undo depth {}", batch.len(), self.undo.len());
        batch
    }

    /// Put back the colors from before the last fill. Batches whose targets
    /// have all disappeared are dropped on the way. `false` when nothing
    /// was left to undo.
    pub fn undo<T>(&mut self, target: &mut T) -> bool
    where
        T: ColorTarget<Handle = H> + ?Sized,
    {
        if !Self::step(&mut self.undo, &mut self.redo, target, self.max_depth) {
            return false;
        }
        info!("undo; stack count {}", self.undo.len());
        true
    }

    /// Re-apply the last undone fill, skipping dead batches like [`History::undo`].
    /// `false` when nothing was left to redo.
    pub fn redo<T>(&mut self, target: &mut T) -> bool
    where
        T: ColorTarget<Handle = H> + ?Sized,
    {
        if !Self::step(&mut self.redo, &mut self.undo, target, self.max_depth) {
            return false;
        }
        info!("redo; stack count {}", self.undo.len());
        true
    }

    /// Revert the newest live batch of `from` and record its inverse on `to`.
    fn step<T>(from: &mut VecDeque<Batch<H>>, to: &mut VecDeque<Batch<H>>, target: &mut T, max_depth: usize) -> bool
    where
        T: ColorTarget<Handle = H> + ?Sized,
    {
        while let Some(batch) = from.pop_back() {
            let inverse = revert(target, &batch);
            if inverse.is_empty() {
                debug!("dropped a history batch of {} vanished element(s)", batch.len());
                continue;
            }
            Self::push_bounded(to, inverse, max_depth);
            return true;
        }
        false
    }
}

/// Set every entry back to its `old_color` and return the batch that undoes that.
fn revert<T, H>(target: &mut T, batch: &[HistoryEntry<H>]) -> Batch<H>
where
    T: ColorTarget<Handle = H> + ?Sized,
    H: Clone + PartialEq,
{
    let mut inverse = Vec::with_capacity(batch.len());
    for entry in batch {
        let Some(current) = target.color_of(&entry.target) else {
            continue;
        };
        target.set_color(&entry.target, entry.old_color);
        inverse.push(HistoryEntry {
            target: entry.target.clone(),
            old_color: current,
            new_color: entry.old_color,
        });
    }
    inverse
}
