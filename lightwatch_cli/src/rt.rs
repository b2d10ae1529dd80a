//! Best-effort real-time setup (Linux mlockall + SCHED_FIFO).
//!
//! Failures are warnings, never fatal: the sampler degrades to ordinary
//! scheduling.

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
        if rc != 0 {
            eprintln!(
                "Warning: mlockall failed: {}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'",
                std::io::Error::last_os_error()
            );
        }

        let (min, max) = unsafe {
            let min = libc::sched_get_priority_min(libc::SCHED_FIFO);
            let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let param = libc::sched_param {
            sched_priority: prio.unwrap_or(max).clamp(min, max),
        };
        let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
        if rc != 0 {
            eprintln!(
                "Warning: SCHED_FIFO not applied: {}; hint: needs CAP_SYS_NICE or root",
                std::io::Error::last_os_error()
            );
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        eprintln!("Warning: real-time setup is only supported on Linux");
    }
}
