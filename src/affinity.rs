//! Optional pinning of pipeline threads to processors.  Purely a
//! locality hint: a render is correct whether or not pinning works.

use tracing::{debug, warn};

/// Core for a pipeline thread: the feeder takes slot 0, workers take
/// `1..=workers`, the collector takes `workers + 1`, all wrapped onto
/// the cores that exist.
pub fn core_for(slot: usize) -> usize {
    slot % num_cpus::get().max(1)
}

/// Restricts the calling thread to `core`.  Returns whether the kernel
/// accepted the request.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> bool {
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
    }
}

/// Pinning is only implemented on Linux; elsewhere the hint is dropped.
#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_core: usize) -> bool {
    false
}

/// Pins the calling thread if `enabled`, logging the outcome.
pub fn apply(enabled: bool, role: &str, slot: usize) {
    if !enabled {
        return;
    }
    let core = core_for(slot);
    if pin_current_thread(core) {
        debug!(role, core, "pinned thread");
    } else {
        warn!(role, core, "could not set CPU affinity");
    }
}
