//! CompileLock: a reentrant reader/writer lock for the compiled-target cache.
//!
//! State is a single atomic word: the high bit marks a writer, the remaining
//! bits count readers. Acquisition retries with a short spin, then yields.
//!
//! The thread holding the writer side may take the lock again, for reading or
//! writing, without blocking. Compiling a subclass compiles its parent under
//! the same writer, and lookups made during a compile read from it. A thread
//! holding only a read guard must drop it before asking for the writer; there
//! is no upgrade.

use std::cell::Cell;
use std::hint;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

const WRITER: usize = 1 << (usize::BITS - 1);
const SPINS_BEFORE_YIELD: u32 = 64;

static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: Cell<u64> = const { Cell::new(0) };
}

fn thread_token() -> u64 {
    THREAD_TOKEN.with(|token| {
        if token.get() == 0 {
            token.set(NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed));
        }
        token.get()
    })
}

fn backoff(spins: &mut u32) {
    if *spins < SPINS_BEFORE_YIELD {
        *spins += 1;
        hint::spin_loop();
    } else {
        thread::yield_now();
    }
}

#[derive(Debug, Default)]
pub struct CompileLock {
    state: AtomicUsize,
    /// Token of the writer thread, 0 when there is none.
    owner: AtomicU64,
    /// Guards held by the writer thread.
    depth: AtomicUsize,
}

impl CompileLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires shared access. Nested inside the writer when called from the
    /// writer thread.
    pub fn read(&self) -> CompileReadGuard<'_> {
        if self.held_by_current_thread() {
            self.depth.fetch_add(1, Ordering::Relaxed);
            return CompileReadGuard {
                lock: self,
                nested: true,
                _not_send: PhantomData,
            };
        }

        let mut spins = 0;
        loop {
            let state = self.state.load(Ordering::Relaxed);
            if state & WRITER == 0
                && self
                    .state
                    .compare_exchange_weak(state, state + 1, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                return CompileReadGuard {
                    lock: self,
                    nested: false,
                    _not_send: PhantomData,
                };
            }
            backoff(&mut spins);
        }
    }

    /// Acquires exclusive access, waiting for readers to leave. Reentrant for
    /// the writer thread.
    pub fn write(&self) -> CompileWriteGuard<'_> {
        if self.held_by_current_thread() {
            self.depth.fetch_add(1, Ordering::Relaxed);
            return CompileWriteGuard {
                lock: self,
                _not_send: PhantomData,
            };
        }

        let mut spins = 0;
        while self
            .state
            .compare_exchange_weak(0, WRITER, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff(&mut spins);
        }
        self.owner.store(thread_token(), Ordering::Relaxed);
        self.depth.store(1, Ordering::Relaxed);
        CompileWriteGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    pub fn is_write_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) & WRITER != 0
    }

    /// Readers outside the writer thread.
    pub fn readers(&self) -> usize {
        self.state.load(Ordering::Relaxed) & !WRITER
    }

    fn held_by_current_thread(&self) -> bool {
        self.state.load(Ordering::Acquire) & WRITER != 0
            && self.owner.load(Ordering::Relaxed) == thread_token()
    }

    fn release_owned(&self) {
        if self.depth.fetch_sub(1, Ordering::Relaxed) == 1 {
            self.owner.store(0, Ordering::Relaxed);
            self.state.fetch_and(!WRITER, Ordering::Release);
        }
    }
}

pub struct CompileReadGuard<'a> {
    lock: &'a CompileLock,
    nested: bool,
    _not_send: PhantomData<*const ()>,
}

impl Drop for CompileReadGuard<'_> {
    fn drop(&mut self) {
        if self.nested {
            self.lock.release_owned();
        } else {
            self.lock.state.fetch_sub(1, Ordering::Release);
        }
    }
}

pub struct CompileWriteGuard<'a> {
    lock: &'a CompileLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for CompileWriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_owned();
    }
}
