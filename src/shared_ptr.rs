#![allow(dead_code)]

use std::{
    fmt::{Debug, Pointer},
    hash::{Hash, Hasher},
    ops::Deref,
    panic::UnwindSafe,
    ptr::{self, NonNull},
    sync::atomic::{fence, AtomicUsize, Ordering},
};

use thiserror::Error;

#[cfg(not(target_has_atomic = "ptr"))]
compile_error!("Cannot use `SharedPtr` on a system without atomics.");

const MAX_REFCOUNT: usize = (isize::MAX) as usize;

/// The error returned by [`SharedPtr::try_deref`] when the handle is empty.
///
/// ```
/// use shptr::{EmptyError, SharedPtr};
///
/// let ptr: SharedPtr<i32> = SharedPtr::empty();
/// assert_eq!(SharedPtr::try_deref(&ptr), Err(EmptyError));
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("attempted to dereference an empty SharedPtr")]
pub struct EmptyError;

/// The shared, atomically counted state behind every owning `SharedPtr`.
///
/// It is allocated separately from the payload so that a payload allocated
/// elsewhere (see [`SharedPtr::from_raw`]) can be adopted without copying it
/// into a combined allocation. The count starts at 1 and reaches 0 exactly
/// once; the thread whose decrement observes the 1 -> 0 transition destroys
/// the payload and then the block.
struct ControlBlock {
    strong: AtomicUsize,
}

impl ControlBlock {
    #[inline]
    fn new() -> Self {
        ControlBlock {
            strong: AtomicUsize::new(1),
        }
    }

    /// Add one owner, returning the previous count so the caller can apply
    /// the overflow guard.
    ///
    /// Relaxed is enough: the caller holds a live handle on this block, so
    /// the count is >= 1 and no increment can race with deallocation.
    #[inline]
    fn increment(&self) -> usize {
        self.strong.fetch_add(1, Ordering::Relaxed)
    }

    /// Remove one owner, returning the previous count. A return value of 1
    /// means this call dropped the count to 0 and the caller must destroy the
    /// payload and the block, after an `Acquire` fence.
    ///
    /// Release here, with the fence taken only on the zero path, makes every
    /// former owner's writes to the payload visible to the destroying thread
    /// without paying an acquire on every drop.
    #[inline]
    fn decrement(&self) -> usize {
        self.strong.fetch_sub(1, Ordering::Release)
    }

    #[inline]
    fn count(&self) -> usize {
        self.strong.load(Ordering::Relaxed)
    }
}

/// The owning half of a `SharedPtr`: a payload pointer paired with its
/// control block. Wrapped in an `Option` by `SharedPtr` so that "empty" and
/// "owning" are the only representable states.
///
/// Both pointers come from `Box::leak`/`Box::into_raw` and are returned to
/// `Box::from_raw` on the final release.
struct Owning<T> {
    payload: NonNull<T>,
    block: NonNull<ControlBlock>,
}

impl<T> Owning<T> {
    #[inline]
    fn block(&self) -> &ControlBlock {
        // SAFETY: the block outlives every handle that refers to it.
        unsafe { self.block.as_ref() }
    }
}

impl<T> Clone for Owning<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Owning<T> {}

/// `SharedPtr<T>` is a heap-allocated smart pointer providing shared
/// ownership of a payload across threads, similar to [`Arc<T>`](std::sync::Arc),
/// with two deliberate differences: a handle may be *empty* (owning nothing),
/// and a payload allocated elsewhere can be adopted from a raw pointer.
///
/// Every owning handle holds a payload pointer and a pointer to a shared
/// control block whose atomic count equals the number of owning handles.
/// Cloning increments the count; dropping, [`reset`](SharedPtr::reset) and
/// reassignment decrement it. The handle whose decrement brings the count to
/// zero destroys the payload and then the control block, exactly once, on
/// whichever thread it happens to run.
///
/// ## Empty handles
/// A default-constructed or [`reset`](SharedPtr::reset) handle owns nothing.
/// Dereferencing it panics; [`SharedPtr::try_deref`] reports [`EmptyError`]
/// instead, and [`SharedPtr::get`] returns [`None`]. The unchecked accessor
/// [`SharedPtr::get_unchecked`] performs no emptiness check at all and is
/// `unsafe` for that reason. This checked/unchecked asymmetry is intentional
/// and mirrors the usual smart-pointer split between `operator*` and
/// `operator->`.
///
/// ## Thread safety
/// Distinct `SharedPtr` instances sharing one control block may be cloned and
/// dropped concurrently from any number of threads. A *single* instance is
/// not safe for concurrent mutation without external synchronization, and no
/// synchronization of the payload itself is provided; sibling handles that
/// mutate the payload must bring their own locking.
///
/// ## Examples
///
/// Example in a single thread:
/// ```
/// use shptr::SharedPtr;
///
/// let ptr = SharedPtr::new(100);
/// let ptr2 = ptr.clone();
/// assert_eq!(*ptr, 100);
/// assert_eq!(SharedPtr::use_count(&ptr), 2);
/// ```
///
/// Example with multiple threads:
/// ```
/// use std::thread;
/// use shptr::SharedPtr;
///
/// let ptr = SharedPtr::new(100);
/// let ptr2 = ptr.clone();
/// let handle = thread::spawn(move || {
///     assert_eq!(*ptr2, 100);
/// });
///
/// handle.join().unwrap();
/// assert_eq!(SharedPtr::use_count(&ptr), 1);
/// ```
pub struct SharedPtr<T> {
    inner: Option<Owning<T>>,
}

unsafe impl<T: Sync + Send> Send for SharedPtr<T> {}
unsafe impl<T: Sync + Send> Sync for SharedPtr<T> {}

impl<T> SharedPtr<T> {
    /// Creates an empty `SharedPtr<T>`. No allocation is performed.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr: SharedPtr<i32> = SharedPtr::empty();
    /// assert!(!SharedPtr::is_owning(&ptr));
    /// assert_eq!(SharedPtr::use_count(&ptr), 0);
    /// ```
    #[inline]
    pub fn empty() -> Self {
        SharedPtr { inner: None }
    }

    /// Creates a new `SharedPtr<T>` owning the provided payload, with a fresh
    /// control block at count 1.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::new(100);
    /// assert_eq!(*ptr, 100);
    /// assert_eq!(SharedPtr::use_count(&ptr), 1);
    /// ```
    #[inline]
    pub fn new(value: T) -> Self {
        let payload = NonNull::from(Box::leak(Box::new(value)));
        let block = NonNull::from(Box::leak(Box::new(ControlBlock::new())));
        SharedPtr {
            inner: Some(Owning { payload, block }),
        }
    }

    /// Adopts a raw payload pointer, taking sole initial ownership of it. A
    /// null pointer yields an empty handle; otherwise a fresh control block
    /// is allocated at count 1.
    ///
    /// # Safety
    /// `raw`, if non-null, must have been obtained from
    /// [`Box::into_raw`], and nothing else may free it or adopt it: adopting
    /// the same pointer into two independent handles leads to a double free.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let raw = Box::into_raw(Box::new(42));
    /// let ptr = unsafe { SharedPtr::from_raw(raw) };
    /// assert_eq!(*ptr, 42);
    /// assert_eq!(SharedPtr::use_count(&ptr), 1);
    /// ```
    #[inline]
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        match NonNull::new(raw) {
            Some(payload) => SharedPtr {
                inner: Some(Owning {
                    payload,
                    block: NonNull::from(Box::leak(Box::new(ControlBlock::new()))),
                }),
            },
            None => SharedPtr::empty(),
        }
    }

    /// Moves ownership out of `this`, leaving it empty. No counter traffic:
    /// the returned handle takes over the payload and control block verbatim.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let mut ptr = SharedPtr::new(100);
    /// let stolen = SharedPtr::take(&mut ptr);
    /// assert!(!SharedPtr::is_owning(&ptr));
    /// assert_eq!(*stolen, 100);
    /// assert_eq!(SharedPtr::use_count(&stolen), 1);
    /// ```
    #[inline]
    pub fn take(this: &mut Self) -> Self {
        core::mem::take(this)
    }

    /// Returns a reference to the payload, or [`EmptyError`] if the handle is
    /// empty. This is the reporting counterpart of the panicking [`Deref`].
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::new(100);
    /// assert_eq!(SharedPtr::try_deref(&ptr), Ok(&100));
    ///
    /// let empty: SharedPtr<i32> = SharedPtr::empty();
    /// assert!(SharedPtr::try_deref(&empty).is_err());
    /// ```
    #[inline]
    pub fn try_deref(this: &Self) -> Result<&T, EmptyError> {
        SharedPtr::get(this).ok_or(EmptyError)
    }

    /// Returns a reference to the payload, or [`None`] if the handle is
    /// empty. Never panics.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::new(100);
    /// assert_eq!(SharedPtr::get(&ptr), Some(&100));
    /// ```
    #[inline]
    pub fn get(this: &Self) -> Option<&T> {
        // SAFETY: an owning handle keeps its payload alive.
        this.inner.as_ref().map(|o| unsafe { o.payload.as_ref() })
    }

    /// Returns a reference to the payload without checking for emptiness.
    ///
    /// # Safety
    /// The handle must be owning. Calling this on an empty handle is
    /// undefined behavior; it is the deliberately unchecked access path and
    /// performs no test the caller could rely on.
    #[inline]
    pub unsafe fn get_unchecked(this: &Self) -> &T {
        this.inner.as_ref().unwrap_unchecked().payload.as_ref()
    }

    /// Returns the raw payload pointer, or null if the handle is empty. The
    /// pointer is valid for as long as some handle keeps the payload alive.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let empty: SharedPtr<i32> = SharedPtr::empty();
    /// assert!(SharedPtr::as_ptr(&empty).is_null());
    /// ```
    #[inline]
    pub fn as_ptr(this: &Self) -> *const T {
        match &this.inner {
            Some(o) => o.payload.as_ptr(),
            None => ptr::null(),
        }
    }

    /// Returns the current number of owning handles, or 0 if this handle is
    /// empty. The value is a relaxed snapshot: under concurrent clones and
    /// drops by sibling handles it may be stale by the time it is read, so it
    /// is advisory and must not be used for synchronization.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::new(100);
    /// let ptr2 = ptr.clone();
    /// assert_eq!(SharedPtr::use_count(&ptr), 2);
    /// assert_eq!(SharedPtr::use_count(&ptr2), 2);
    /// ```
    #[inline]
    pub fn use_count(this: &Self) -> usize {
        match &this.inner {
            Some(o) => o.block().count(),
            None => 0,
        }
    }

    /// Returns `true` iff the handle currently owns a payload.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// assert!(SharedPtr::is_owning(&SharedPtr::new(100)));
    /// assert!(!SharedPtr::is_owning(&SharedPtr::<i32>::empty()));
    /// ```
    #[inline]
    pub fn is_owning(this: &Self) -> bool {
        this.inner.is_some()
    }

    /// Checks whether two handles share the same payload allocation.
    /// Two empty handles are not considered equal here.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::new(100);
    /// let ptr2 = ptr.clone();
    /// assert!(SharedPtr::ptr_eq(&ptr, &ptr2));
    /// assert!(!SharedPtr::ptr_eq(&ptr, &SharedPtr::new(100)));
    /// ```
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        match (&this.inner, &other.inner) {
            (Some(a), Some(b)) => a.payload.as_ptr() == b.payload.as_ptr(),
            _ => false,
        }
    }

    /// Releases the current ownership, if any, leaving the handle empty. If
    /// this handle was the last owner, the payload is destroyed.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let mut ptr = SharedPtr::new(100);
    /// SharedPtr::reset(&mut ptr);
    /// assert!(!SharedPtr::is_owning(&ptr));
    /// ```
    #[inline]
    pub fn reset(this: &mut Self) {
        this.release();
    }

    /// Releases the current ownership, then adopts `raw` exactly as
    /// [`SharedPtr::from_raw`] does. The old payload is released before the
    /// new one is adopted.
    ///
    /// # Safety
    /// Same contract as [`SharedPtr::from_raw`].
    #[inline]
    pub unsafe fn reset_raw(this: &mut Self, raw: *mut T) {
        this.release();
        *this = SharedPtr::from_raw(raw);
    }

    /// Drop one owner from the held block, destroying payload and block on
    /// the 1 -> 0 transition. Leaves the handle empty.
    fn release(&mut self) {
        if let Some(own) = self.inner.take() {
            if own.block().decrement() == 1 {
                // Synchronize with every prior owner's release before
                // touching the payload.
                fence(Ordering::Acquire);
                // SAFETY: count hit 0, so this is the only remaining path to
                // either allocation; both came from Box::into_raw/Box::leak.
                // Payload first, then the block.
                unsafe {
                    drop(Box::from_raw(own.payload.as_ptr()));
                    drop(Box::from_raw(own.block.as_ptr()));
                }
            }
        }
    }
}

impl<T> Clone for SharedPtr<T> {
    /// Clone a `SharedPtr<T>`, incrementing the shared count before the new
    /// handle becomes visible. Cloning an empty handle yields an empty handle
    /// and touches no counter. Panics if the count overflows.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::new(100);
    /// let ptr2 = ptr.clone();
    /// assert_eq!(SharedPtr::use_count(&ptr), 2);
    /// ```
    #[inline]
    fn clone(&self) -> Self {
        if let Some(own) = &self.inner {
            let prev = own.block().increment();
            if prev > MAX_REFCOUNT {
                panic!("Overflow of maximum strong reference count.");
            }
        }
        SharedPtr { inner: self.inner }
    }

    /// Assignment from another handle. The source's count is incremented
    /// before the destination's old ownership is released, so an aliasing
    /// assignment between two handles sharing one block can never drive the
    /// count through zero mid-assignment.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::new(100);
    /// let mut alias = ptr.clone();
    /// alias.clone_from(&ptr);
    /// assert_eq!(SharedPtr::use_count(&ptr), 2);
    /// ```
    #[inline]
    fn clone_from(&mut self, source: &Self) {
        let incoming = source.clone();
        self.release();
        *self = incoming;
    }
}

impl<T> Drop for SharedPtr<T> {
    #[inline]
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> Deref for SharedPtr<T> {
    type Target = T;

    /// Get an immutable reference to the payload.
    ///
    /// # Panics
    /// Panics if the handle is empty. Use [`SharedPtr::try_deref`] for a
    /// reporting variant or [`SharedPtr::get`] for a non-panicking one.
    /// ```
    /// use shptr::SharedPtr;
    /// use std::ops::Deref;
    ///
    /// let ptr = SharedPtr::new(100i32);
    /// assert_eq!(*ptr, 100i32);
    /// assert_eq!(ptr.deref(), &100i32);
    /// ```
    ///
    /// ```should_panic
    /// use shptr::SharedPtr;
    ///
    /// let empty: SharedPtr<i32> = SharedPtr::empty();
    /// let _ = *empty;
    /// ```
    #[inline]
    fn deref(&self) -> &Self::Target {
        match SharedPtr::get(self) {
            Some(data) => data,
            None => panic!("attempted to dereference an empty SharedPtr"),
        }
    }
}

impl<T> Default for SharedPtr<T> {
    /// The default handle is empty; it owns nothing and allocates nothing.
    #[inline]
    fn default() -> Self {
        SharedPtr::empty()
    }
}

impl<T> From<T> for SharedPtr<T> {
    /// Create a new `SharedPtr<T>` owning the provided payload. This is
    /// equivalent to calling `SharedPtr::new` on the same data.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::from(100);
    /// assert_eq!(*ptr, 100);
    /// ```
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Debug> Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match SharedPtr::get(self) {
            Some(data) => Debug::fmt(data, f),
            None => f.write_str("<empty>"),
        }
    }
}

impl<T> Pointer for SharedPtr<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Pointer::fmt(&SharedPtr::as_ptr(self), f)
    }
}

impl<T: PartialEq> PartialEq for SharedPtr<T> {
    /// Equality by payload value, with empty handles comparing equal only to
    /// other empty handles.
    /// ```
    /// use shptr::SharedPtr;
    ///
    /// let ptr = SharedPtr::from(100);
    /// let ptr2 = SharedPtr::from(100);
    /// assert!(ptr == ptr2);
    /// assert!(ptr != SharedPtr::empty());
    /// ```
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        SharedPtr::get(self) == SharedPtr::get(other)
    }
}

impl<T: Eq> Eq for SharedPtr<T> {}

impl<T: Hash> Hash for SharedPtr<T> {
    /// Pass the payload (or the empty marker) to the provided hasher.
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        SharedPtr::get(self).hash(state);
    }
}

impl<T> UnwindSafe for SharedPtr<T> {}
