use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierWait {
    /// The last thread to arrive, which released the others
    Leader,
    Follower,
    /// The barrier was disabled before or while waiting
    Disabled,
}

struct BarrierState {
    arrived: usize,
    // Flipped by the last arrival. Waiters compare against the sign they arrived with,
    // so a fast thread re-entering the next phase can't be confused with the current one.
    sign: bool,
    disabled: bool,
}

/// A reusable rendezvous point for exactly `participants` threads.
pub struct TwoPhaseBarrier {
    participants: usize,
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

impl TwoPhaseBarrier {
    pub fn new(participants: usize) -> Self {
        assert!(participants > 0, "Barrier needs at least one participant");
        TwoPhaseBarrier {
            participants,
            state: Mutex::new(BarrierState {
                arrived: 0,
                sign: false,
                disabled: false,
            }),
            condvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until all participants have called `wait` in the current phase.
    pub fn wait(&self) -> BarrierWait {
        let mut state = self.lock();
        if state.disabled {
            return BarrierWait::Disabled;
        }

        let sign = state.sign;
        state.arrived += 1;

        if state.arrived == self.participants {
            state.arrived = 0;
            state.sign = !sign;
            self.condvar.notify_all();
            return BarrierWait::Leader;
        }

        while state.sign == sign && !state.disabled {
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.sign == sign {
            BarrierWait::Disabled
        } else {
            BarrierWait::Follower
        }
    }

    /// Permanently releases every current and future waiter.
    pub fn disable(&self) {
        let mut state = self.lock();
        if !state.disabled {
            state.disabled = true;
            log::debug!("Barrier for {} participants disabled", self.participants);
        }
        self.condvar.notify_all();
    }

    pub fn is_disabled(&self) -> bool {
        self.lock().disabled
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn test_single_participant_never_blocks() {
        let barrier = TwoPhaseBarrier::new(1);
        for _ in 0..10 {
            assert_eq!(barrier.wait(), BarrierWait::Leader);
        }
    }

    #[test]
    fn test_threads_move_in_lockstep() {
        const THREADS: usize = 6;
        const PHASES: usize = 200;

        let barrier = Arc::new(TwoPhaseBarrier::new(THREADS));
        let arrivals: Arc<Vec<AtomicUsize>> =
            Arc::new((0..PHASES).map(|_| AtomicUsize::new(0)).collect());
        let leaders = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let barrier = barrier.clone();
                let arrivals = arrivals.clone();
                let leaders = leaders.clone();
                thread::spawn(move || {
                    let mut completed = 0;
                    for phase in 0..PHASES {
                        if fastrand::u8(0..4) == 0 {
                            thread::sleep(Duration::from_micros(fastrand::u64(0..200)));
                        }
                        arrivals[phase].fetch_add(1, Ordering::SeqCst);
                        let result = barrier.wait();
                        // Nobody may leave a phase before everyone arrived
                        assert_eq!(arrivals[phase].load(Ordering::SeqCst), THREADS);
                        if result == BarrierWait::Leader {
                            leaders.fetch_add(1, Ordering::SeqCst);
                        }
                        assert_ne!(result, BarrierWait::Disabled);
                        completed += 1;
                    }
                    completed
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), PHASES);
        }
        assert_eq!(leaders.load(Ordering::SeqCst), PHASES);
    }

    #[test]
    fn test_disable_releases_waiters() {
        let barrier = Arc::new(TwoPhaseBarrier::new(4));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let barrier = barrier.clone();
                thread::spawn(move || barrier.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        barrier.disable();
        barrier.disable();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), BarrierWait::Disabled);
        }
        assert!(start.elapsed() < Duration::from_secs(2));

        assert!(barrier.is_disabled());
        assert_eq!(barrier.wait(), BarrierWait::Disabled);
    }
}
