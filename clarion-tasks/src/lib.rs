//! A single-threaded cooperative scheduler.
//!
//! Tasks are spawned onto a local executor and only make progress when the owner calls
//! [`Scheduler::tick`]. A task can park itself until the next tick, which is how polled
//! conditions ("wait until the channel stops playing") are expressed without a thread per task.

use std::{
    cell::{Cell, RefCell},
    fmt,
    fmt::Debug,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use async_executor::LocalExecutor;
use futures_lite::FutureExt as _;
use tracing::trace;

pub struct LocalTask<T> {
    task: async_task::Task<T>,
}

impl<T> LocalTask<T> {
    pub fn detach(self) {
        self.task.detach()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn poll_naive(&mut self) -> Option<T> {
        // this is slightly inefficient as it will end up registering the waker, even though we don't need it
        match self
            .task
            .poll(&mut Context::from_waker(Waker::noop()))
        {
            Poll::Ready(result) => Some(result),
            Poll::Pending => None,
        }
    }
}

impl<T> Future for LocalTask<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().task.poll(cx)
    }
}

impl<T> Debug for LocalTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.task.fmt(f)
    }
}

#[derive(Default)]
struct TickState {
    tick: Cell<u64>,
    parked: RefCell<Vec<Waker>>,
}

/// A cheap handle used by tasks to suspend themselves until a later tick.
#[derive(Clone)]
pub struct TickHandle {
    state: Rc<TickState>,
}

impl TickHandle {
    /// Number of ticks executed so far.
    pub fn current_tick(&self) -> u64 {
        self.state.tick.get()
    }

    /// Resolves on the tick after the one it was created on.
    pub fn next_tick(&self) -> NextTick {
        NextTick {
            state: self.state.clone(),
            target: self.state.tick.get() + 1,
        }
    }

    /// Suspends until `predicate` holds.
    ///
    /// The predicate is evaluated immediately, and then once per tick until it returns `true`.
    pub async fn wait_until<F: FnMut() -> bool>(&self, mut predicate: F) {
        while !predicate() {
            self.next_tick().await;
        }
    }
}

impl Debug for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHandle")
            .field("tick", &self.state.tick.get())
            .finish()
    }
}

#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct NextTick {
    state: Rc<TickState>,
    target: u64,
}

impl Future for NextTick {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.tick.get() >= self.target {
            Poll::Ready(())
        } else {
            self.state.parked.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}

/// Owns the local executor. Cloning produces another handle to the same executor.
#[derive(Clone)]
pub struct Scheduler {
    executor: Rc<LocalExecutor<'static>>,
    ticks: TickHandle,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            executor: Rc::new(LocalExecutor::new()),
            ticks: TickHandle {
                state: Rc::new(TickState::default()),
            },
        }
    }

    pub fn handle(&self) -> TickHandle {
        self.ticks.clone()
    }

    /// Spawns a task. It will first be polled during the next [`Scheduler::tick`].
    pub fn spawn<T, F>(&self, f: F) -> LocalTask<T>
    where
        F: Future<Output = T> + 'static,
        T: 'static,
    {
        LocalTask {
            task: self.executor.spawn(f),
        }
    }

    /// Runs a single scheduling step: advances the tick counter, wakes every task parked on a tick
    /// and then runs the executor until no task can make further progress.
    ///
    /// Returns the number of the tick that was just executed.
    pub fn tick(&self) -> u64 {
        let state = &self.ticks.state;
        let tick = state.tick.get() + 1;
        state.tick.set(tick);

        // take the wakers out first, tasks woken here may park again for the next tick
        let parked = std::mem::take(&mut *state.parked.borrow_mut());
        trace!("Tick {}: waking {} parked tasks", tick, parked.len());
        for waker in parked {
            waker.wake();
        }

        while self.executor.try_tick() {}

        tick
    }

    /// Returns `true` if there are no unfinished tasks.
    pub fn is_idle(&self) -> bool {
        self.executor.is_empty()
    }
}

impl Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tick", &self.ticks.current_tick())
            .field("idle", &self.is_idle())
            .finish()
    }
}
