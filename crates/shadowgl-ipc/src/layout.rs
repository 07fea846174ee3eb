//! Record framing constants shared by the client and server ends.
//!
//! Every record in a ring starts with a [`HEADER_BYTES`]-byte header of three little-endian `u32`s:
//!
//! - opcode (commands) or reply kind (replies)
//! - total record size in bytes, header and trailing padding included
//! - token
//!
//! followed by the payload, zero-padded to [`RECORD_ALIGN`].

/// All ring records are aligned to this many bytes.
pub const RECORD_ALIGN: usize = 4;

/// Size of the fixed record header.
pub const HEADER_BYTES: usize = 12;

/// Ring capacity used when nothing else is configured (rounded up to the page size at creation).
pub const DEFAULT_RING_BYTES: usize = 1 << 20;

/// Directory holding the unlinked ring backing files.
pub const DEFAULT_SHM_DIR: &str = "/dev/shm";

/// Token value meaning "nothing acknowledged yet". Clients start numbering at 1.
pub const NO_TOKEN: u32 = 0;

pub mod header {
    //! Byte offsets into the record header.

    pub const OPCODE: usize = 0;
    pub const SIZE: usize = 4;
    pub const TOKEN: usize = 8;
}

pub(crate) const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + (align - 1)) & !(align - 1)
}

/// Host page size, falling back to 4 KiB if `sysconf` cannot report it.
pub fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw > 0 {
        raw as usize
    } else {
        4096
    }
}

/// Round `len` up to a whole number of host pages (never zero).
pub fn round_to_page(len: usize) -> usize {
    let page = page_size();
    len.max(1).div_ceil(page) * page
}
