use libc::c_int;

/// Marker byte stamped into the top byte of a descriptor that belongs to the
/// virtual namespace.
pub const VIRTUAL_MARKER: u32 = 0xbb;

const MARKER_SHIFT: u32 = c_int::BITS - 8;
const LOW_MASK: u32 = !(0xff << MARKER_SHIFT);

/// True iff the top byte of `fd` carries the virtual marker.
pub fn is_virtual(fd: c_int) -> bool {
    (((fd as u32) >> MARKER_SHIFT) & 0xff) == VIRTUAL_MARKER
}

/// Strips the marker from a virtual descriptor. Anything else is returned
/// unchanged.
pub fn demangle(fd: c_int) -> c_int {
    if is_virtual(fd) {
        ((fd as u32) & LOW_MASK) as c_int
    } else {
        fd
    }
}

/// Replaces whatever occupies the top byte of `fd` with the virtual marker.
///
/// No validity check happens here; callers only mangle descriptors whose low
/// bits name a live real descriptor.
pub fn mangle(fd: c_int) -> c_int {
    (((fd as u32) & LOW_MASK) | (VIRTUAL_MARKER << MARKER_SHIFT)) as c_int
}
