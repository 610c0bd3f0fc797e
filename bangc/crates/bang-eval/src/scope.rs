//! The runtime scope chain.
//!
//! A stack of frames, each a name→value map behind an `Rc<RefCell<..>>`
//! handle. Handles are what closures capture: declaring a function
//! snapshots the *list* of frames (shallow copy of references), so names
//! added to those frames later — including the function's own binding —
//! are visible inside the body. Calling the function then clones each
//! captured frame's contents, so writes made during the call do not leak
//! back out (but container values, being reference-typed, still do).

use std::cell::RefCell;
use std::rc::Rc;

use bang_util::Symbol;
use rustc_hash::FxHashMap;

use crate::value::Value;

pub type Frame = FxHashMap<Symbol, Value>;

pub struct ScopeStack {
    frames: Vec<Rc<RefCell<Frame>>>,
}

impl ScopeStack {
    /// A fresh chain with one (global) frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Rc::new(RefCell::new(Frame::default()))],
        }
    }

    /// Build the chain a call executes in: each captured frame cloned by
    /// contents, one empty frame on top for the call's own locals.
    pub fn for_call(captured: &[Rc<RefCell<Frame>>]) -> Self {
        let mut frames: Vec<Rc<RefCell<Frame>>> = captured
            .iter()
            .map(|frame| Rc::new(RefCell::new(frame.borrow().clone())))
            .collect();
        frames.push(Rc::new(RefCell::new(Frame::default())));
        Self { frames }
    }

    pub fn push(&mut self) {
        self.frames.push(Rc::new(RefCell::new(Frame::default())));
    }

    pub fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1, "global frame must not be popped");
        self.frames.pop();
    }

    /// Look a name up, innermost frame first.
    pub fn get(&self, name: Symbol) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.borrow().get(&name).cloned())
    }

    /// Write to the innermost frame already holding `name`, else create
    /// the binding in the current frame.
    pub fn assign(&mut self, name: Symbol, value: Value) {
        for frame in self.frames.iter().rev() {
            let mut frame = frame.borrow_mut();
            if let Some(slot) = frame.get_mut(&name) {
                *slot = value;
                return;
            }
        }
        self.frames
            .last()
            .expect("scope stack never empty")
            .borrow_mut()
            .insert(name, value);
    }

    /// Snapshot the frame list for closure capture. Shallow: the frames
    /// themselves are shared, only the list is copied.
    pub fn snapshot(&self) -> Vec<Rc<RefCell<Frame>>> {
        self.frames.clone()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
