//! Shadow call stack
//!
//! Every method the runtime runs (direct dispatch, reflective invocation and
//! hook dispatch) pushes a [`Frame`] for its duration. The stack is
//! thread-local: each thread only ever sees its own frames.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;

use crate::object::{ClassRef, ObjectRef};

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// One entry of the call stack
#[derive(Clone)]
pub struct Frame {
    /// Class the running code belongs to
    pub class: ClassRef,
    /// Bound instance, `None` in class-level code
    pub this: Option<ObjectRef>,
    /// Function name
    pub function: String,
}

impl Frame {
    /// Frame for code running on an instance
    pub fn instance(this: &ObjectRef, function: impl Into<String>) -> Self {
        Self {
            class: this.class().clone(),
            this: Some(this.clone()),
            function: function.into(),
        }
    }

    /// Frame for class-level code
    pub fn class_level(class: &ClassRef, function: impl Into<String>) -> Self {
        Self {
            class: class.clone(),
            this: None,
            function: function.into(),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.this {
            Some(obj) => write!(f, "{}#{}->{}", self.class.name(), obj.id(), self.function),
            None => write!(f, "{}::{}", self.class.name(), self.function),
        }
    }
}

/// Pops its frame when dropped
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct FrameGuard {
    // Frames belong to the thread that pushed them
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Access to the current thread's call stack
pub struct CallStack;

impl CallStack {
    /// Push `frame` until the returned guard is dropped
    pub fn enter(frame: Frame) -> FrameGuard {
        FRAMES.with(|frames| frames.borrow_mut().push(frame));
        FrameGuard {
            _not_send: PhantomData,
        }
    }

    /// Innermost frame
    pub fn current() -> Option<Frame> {
        FRAMES.with(|frames| frames.borrow().last().cloned())
    }

    /// Up to `limit` frames, most recent first
    pub fn backtrace(limit: usize) -> Vec<Frame> {
        FRAMES.with(|frames| frames.borrow().iter().rev().take(limit).cloned().collect())
    }

    /// Number of frames on this thread
    pub fn depth() -> usize {
        FRAMES.with(|frames| frames.borrow().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ClassBuilder, Object};

    #[test]
    fn test_guard_pops_on_drop() {
        let class = ClassBuilder::new("Runner").build();
        let base = CallStack::depth();
        {
            let _outer = CallStack::enter(Frame::class_level(&class, "outer"));
            let _inner = CallStack::enter(Frame::class_level(&class, "inner"));
            assert_eq!(CallStack::depth(), base + 2);
            assert_eq!(CallStack::current().unwrap().function, "inner");
        }
        assert_eq!(CallStack::depth(), base);
    }

    #[test]
    fn test_backtrace_is_newest_first_and_bounded() {
        let class = ClassBuilder::new("Runner").build();
        let obj = Object::instantiate(&class);

        let _a = CallStack::enter(Frame::class_level(&class, "a"));
        let _b = CallStack::enter(Frame::instance(&obj, "b"));
        let _c = CallStack::enter(Frame::class_level(&class, "c"));

        let trace = CallStack::backtrace(2);
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].function, "c");
        assert_eq!(trace[1].function, "b");
        assert!(trace[1].this.is_some());
    }

    #[test]
    fn test_stacks_are_per_thread() {
        let class = ClassBuilder::new("Runner").build();
        let _main = CallStack::enter(Frame::class_level(&class, "main"));

        let depth_elsewhere = std::thread::spawn(CallStack::depth).join().unwrap();
        assert_eq!(depth_elsewhere, 0);
    }
}
