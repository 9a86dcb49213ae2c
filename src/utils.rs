use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock seconds since the epoch, for phase timing logs.
pub fn realtime() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs_f64()
}

/// Accumulated user+system cpu seconds of this process.
pub fn cputime() -> f64 {
    let rusage = unsafe {
        let mut rusage = std::mem::MaybeUninit::uninit();
        libc::getrusage(libc::RUSAGE_SELF, rusage.as_mut_ptr());
        rusage.assume_init()
    };
    let user = rusage.ru_utime;
    let sys = rusage.ru_stime;
    (user.tv_sec as f64 + user.tv_usec as f64 * 1e-6)
        + (sys.tv_sec as f64 + sys.tv_usec as f64 * 1e-6)
}
