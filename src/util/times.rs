use libc::{timespec, timeval, utimbuf};

fn timeval_to_timespec(tv: &timeval) -> timespec {
    timespec {
        tv_sec: tv.tv_sec,
        tv_nsec: tv.tv_usec * 1000,
    }
}

/// Converts a `utimes`-style `timeval[2]` into the `timespec[2]` the `*at`
/// calls take. A null pointer means "now" and maps to `None`.
///
/// # Safety
/// `times` must be null or point at two readable `timeval`s.
pub unsafe fn timevals_to_timespecs(
    times: *const timeval,
) -> Option<[timespec; 2]> {
    if times.is_null() {
        return None;
    }
    let times = unsafe { std::slice::from_raw_parts(times, 2) };
    Some([timeval_to_timespec(&times[0]), timeval_to_timespec(&times[1])])
}

/// # Safety
/// `buf` must be null or point at a readable `utimbuf`.
pub unsafe fn utimbuf_to_timespecs(buf: *const utimbuf) -> Option<[timespec; 2]> {
    let buf = unsafe { buf.as_ref() }?;
    Some([
        timespec {
            tv_sec: buf.actime,
            tv_nsec: 0,
        },
        timespec {
            tv_sec: buf.modtime,
            tv_nsec: 0,
        },
    ])
}
