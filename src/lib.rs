//! `SharedPtr<T>` is a heap-allocated smart pointer for sharing a value across threads in a thread-safe manner without putting locks on the data.
//! It provides shared ownership of the payload similar to `Arc<T>`, with two deliberate differences: a handle may be
//! *empty* (it owns nothing, and dereferencing it is a reportable failure rather than unrepresentable), and a payload
//! allocated elsewhere can be adopted from a raw pointer via [`SharedPtr::from_raw`].
//!
//! Every owning handle pairs a payload pointer with a pointer to a shared control block holding one atomic counter.
//! Cloning a handle increments the counter; dropping, resetting or reassigning one decrements it. Whichever handle's
//! decrement observes the transition to zero destroys the payload and then the control block, exactly once, with an
//! acquire/release handshake that makes every former owner's writes to the payload visible to the destroying thread.
//!
//! Only the *lifetime* of the payload is managed: sibling handles that mutate the payload concurrently must bring
//! their own synchronization.

pub mod shared_ptr;
pub use crate::shared_ptr::EmptyError;
pub use crate::shared_ptr::SharedPtr;
