//! Call stack reconstruction from depth-tagged entry/exit records.
//!
//! Frames live in a vector indexed by `depth + 1`. Slot 0 is a sentinel for
//! depth -1 and slot 1 a sentinel for depth 0, so the exit of the outermost
//! call always has a parent to charge its cost to.
//!
//! Structural problems in the trace (exits without an open frame, frames
//! that never close, skipped depth levels, impossible depths) are counted and
//! skipped rather than treated as errors. Cost arithmetic saturates so a
//! corrupt timestamp cannot wrap the totals.

use crate::parser::record::TraceEvent;
use crate::utils::config::{MAX_STACK_DEPTH, MICROS_PER_SECOND};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Convert a trace timestamp in seconds to whole microseconds
pub fn to_micros(seconds: f64) -> i64 {
    (seconds * MICROS_PER_SECOND).round() as i64
}

/// One open call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFrame {
    /// `None` for sentinels and for placeholders filling skipped depths
    pub function: Option<String>,
    pub entry_time: i64,
    pub entry_memory: i64,
    pub nested_time: i64,
    pub nested_memory: i64,
    /// Line number of the entry record
    pub sequence: usize,
}

impl StackFrame {
    fn sentinel() -> Self {
        Self::default()
    }

    fn is_open(&self) -> bool {
        self.function.is_some()
    }
}

/// A matched entry/exit pair, ready to be folded into the aggregates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCall {
    pub function: String,
    /// Inclusive time of this call in microseconds
    pub time: i64,
    /// Memory watermark difference between exit and entry
    pub memory: i64,
    pub nested_time: i64,
    pub nested_memory: i64,
    pub sequence: usize,
    /// An outer invocation of the same function is still on the stack
    pub outer_active: bool,
}

/// Deepest self-nesting observed for a single function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionPeak {
    pub function: String,
    pub depth: usize,
}

/// Structural anomalies and shape information gathered by the tracker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackDiagnostics {
    pub unmatched_exits: u64,
    /// Open frames discarded because a record at the same or a shallower depth arrived
    pub abandoned_frames: u64,
    pub depth_gaps: u64,
    /// Entries skipped because their depth exceeded `MAX_STACK_DEPTH`
    pub rejected_depths: u64,
    pub max_depth: u32,
    pub deepest_recursion: Option<RecursionPeak>,
}

/// Tracks open frames and active function names for one pass
#[derive(Debug)]
pub struct CallStackTracker {
    frames: Vec<StackFrame>,
    active: HashMap<String, usize>,
    diagnostics: StackDiagnostics,
}

impl Default for CallStackTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CallStackTracker {
    pub fn new() -> Self {
        Self {
            frames: vec![StackFrame::sentinel(), StackFrame::sentinel()],
            active: HashMap::new(),
            diagnostics: StackDiagnostics::default(),
        }
    }

    /// Open a frame for an entry record
    ///
    /// **Public** - called by the session for every entry event
    ///
    /// # Arguments
    /// * `event` - decoded entry record
    /// * `sequence` - line number of the record
    pub fn enter(&mut self, event: &TraceEvent, sequence: usize) {
        if event.depth > MAX_STACK_DEPTH {
            debug!(
                "Line {}: entry depth {} exceeds {}, skipping",
                sequence, event.depth, MAX_STACK_DEPTH
            );
            self.diagnostics.rejected_depths += 1;
            return;
        }

        let slot = event.depth as usize + 1;

        self.abandon_from(slot);

        if self.frames.len() < slot {
            debug!(
                "Line {}: depth jumped to {} with only {} levels open",
                sequence,
                event.depth,
                self.frames.len() - 1
            );
            self.diagnostics.depth_gaps += 1;
            self.frames.resize(slot, StackFrame::sentinel());
        }

        self.frames.push(StackFrame {
            function: Some(event.name.clone()),
            entry_time: to_micros(event.timestamp),
            entry_memory: event.memory,
            nested_time: 0,
            nested_memory: 0,
            sequence,
        });

        self.diagnostics.max_depth = self.diagnostics.max_depth.max(event.depth);
        self.acquire(&event.name);
    }

    /// Close the frame at the record's depth
    ///
    /// **Public** - called by the session for every exit event
    ///
    /// # Returns
    /// The completed call, or `None` when no frame is open at that depth
    pub fn exit(&mut self, event: &TraceEvent, sequence: usize) -> Option<CompletedCall> {
        let slot = event.depth as usize + 1;

        let matched = event.depth <= MAX_STACK_DEPTH
            && self.frames.get(slot).is_some_and(StackFrame::is_open);
        if !matched {
            debug!(
                "Line {}: exit at depth {} has no matching entry",
                sequence, event.depth
            );
            self.diagnostics.unmatched_exits += 1;
            return None;
        }

        self.abandon_from(slot + 1);

        let frame = self.frames.pop()?;
        let function = frame.function?;

        let time = to_micros(event.timestamp).saturating_sub(frame.entry_time);
        let memory = event.memory.saturating_sub(frame.entry_memory);

        if let Some(parent) = self.frames.last_mut() {
            parent.nested_time = parent.nested_time.saturating_add(time);
            parent.nested_memory = parent.nested_memory.saturating_add(memory);
        }

        let outer_active = self.release(&function);

        Some(CompletedCall {
            function,
            time,
            memory,
            nested_time: frame.nested_time,
            nested_memory: frame.nested_memory,
            sequence: frame.sequence,
            outer_active,
        })
    }

    /// Number of frames opened by the trace and not yet closed
    pub fn open_frames(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_open()).count()
    }

    /// Current active invocation count for a function name
    #[cfg(test)]
    fn active_count(&self, function: &str) -> usize {
        self.active.get(function).copied().unwrap_or(0)
    }

    pub fn diagnostics(&self) -> &StackDiagnostics {
        &self.diagnostics
    }

    /// Consume the tracker, returning its diagnostics and the number of frames left open
    pub fn finish(self) -> (StackDiagnostics, usize) {
        let open = self.open_frames();
        (self.diagnostics, open)
    }

    /// Drop every frame at `slot` and deeper, releasing their names
    fn abandon_from(&mut self, slot: usize) {
        if slot >= self.frames.len() {
            return;
        }

        let dropped: Vec<StackFrame> = self.frames.drain(slot..).collect();
        for frame in dropped {
            if let Some(function) = frame.function {
                debug!(
                    "Abandoning unterminated frame '{}' opened at line {}",
                    function, frame.sequence
                );
                self.diagnostics.abandoned_frames += 1;
                self.release(&function);
            }
        }
    }

    fn acquire(&mut self, function: &str) {
        let count = self.active.entry(function.to_string()).or_insert(0);
        *count += 1;
        let depth = *count;

        let deeper = self
            .diagnostics
            .deepest_recursion
            .as_ref()
            .map_or(depth > 1, |peak| depth > peak.depth);
        if deeper {
            self.diagnostics.deepest_recursion = Some(RecursionPeak {
                function: function.to_string(),
                depth,
            });
        }
    }

    /// Decrement the active count, returning whether an outer invocation remains
    fn release(&mut self, function: &str) -> bool {
        match self.active.get_mut(function) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.active.remove(function);
                false
            }
            None => false,
        }
    }
}
