//! Worker-thread pinning.
//!
//! When a [`ClockConfig`](crate::config::ClockConfig) asks for pinned
//! workers, each worker of a cycle holds a [`CpuPinGuard`] for its core while
//! it drains the batch. The guard restores the previous affinity mask on
//! drop so no pinning survives the cycle.
//!
//! Only Linux can really pin; elsewhere the guard is inert.

#[cfg(target_os = "linux")]
mod platform {
    /// Number of online cores.
    pub fn core_count() -> Option<usize> {
        let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if n <= 0 {
            None
        } else {
            Some(n as usize)
        }
    }

    pub type Mask = libc::cpu_set_t;

    pub fn current_mask() -> Option<Mask> {
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) == 0 {
                Some(set)
            } else {
                None
            }
        }
    }

    pub fn pin(core_id: usize) -> bool {
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core_id, &mut set);
            libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
        }
    }

    pub fn restore(mask: &Mask) -> bool {
        unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), mask) == 0 }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    pub fn core_count() -> Option<usize> {
        std::thread::available_parallelism().ok().map(|n| n.get())
    }

    pub type Mask = ();

    pub fn current_mask() -> Option<Mask> {
        None
    }

    pub fn pin(_core_id: usize) -> bool {
        false
    }

    pub fn restore(_mask: &Mask) -> bool {
        true
    }
}

/// Number of online CPU cores, if the platform reports it.
pub fn core_count() -> Option<usize> {
    platform::core_count()
}

/// RAII guard: pins the current thread on creation, restores on drop.
pub struct CpuPinGuard {
    pinned_core: Option<usize>,
    saved: Option<platform::Mask>,
}

impl CpuPinGuard {
    /// Pin the current thread to `core_id`.
    pub fn with_core(core_id: usize) -> Self {
        let saved = platform::current_mask();
        let pinned = saved.is_some() && platform::pin(core_id);
        Self {
            pinned_core: pinned.then_some(core_id),
            saved,
        }
    }

    /// Pin worker `index` of a pool, spreading workers round-robin over the
    /// online cores.
    pub fn for_worker(index: usize) -> Self {
        match core_count() {
            Some(cores) => Self::with_core(index % cores),
            None => Self {
                pinned_core: None,
                saved: None,
            },
        }
    }

    pub fn core_id(&self) -> Option<usize> {
        self.pinned_core
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_core.is_some()
    }
}

impl Drop for CpuPinGuard {
    fn drop(&mut self) {
        if self.pinned_core.is_some() {
            if let Some(mask) = self.saved.as_ref() {
                if !platform::restore(mask) {
                    tracing::debug!("failed to restore CPU affinity");
                }
            }
        }
    }
}
