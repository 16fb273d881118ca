//! Rule construction and the once/periodic execution state machine.
//!
//! [`Executor::create_from_desc`] resolves a descriptor into a runtime
//! [`Rule`]. [`Executor::execute`] then drives it: one debounced attempt for
//! one-shot rules, or a loop that runs until its scope is cancelled for
//! periodic rules.

mod core;
mod rule;


pub use self::core::Executor;
pub use self::rule::Rule;
