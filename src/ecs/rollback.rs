//! Fixed-depth frame history

use std::collections::VecDeque;

/// Ring of the most recent `depth` frames, oldest first
#[derive(Debug, Clone)]
pub struct RollbackBuffer<T> {
    frames: VecDeque<T>,
    depth: usize,
}

impl<T> RollbackBuffer<T> {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            frames: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Store a frame, evicting the oldest when full
    pub fn push(&mut self, frame: T) {
        if self.frames.len() == self.depth {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Frame `frames_back` steps before the newest (0 = newest)
    pub fn get(&self, frames_back: usize) -> Option<&T> {
        let len = self.frames.len();
        if frames_back >= len {
            return None;
        }
        self.frames.get(len - 1 - frames_back)
    }

    /// Drop the `frames_back` newest frames and return the one that is now newest
    pub fn rewind(&mut self, frames_back: usize) -> Option<&T> {
        if frames_back >= self.frames.len() {
            return None;
        }
        self.frames.truncate(self.frames.len() - frames_back);
        self.frames.back()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
