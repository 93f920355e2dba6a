//! Timer-control ioctls for the deck character device
//!
//! The device exposes four control requests under ioctl magic `'p'`:
//! timer enable state as a `u8` (nr 1, read/write) and timer tick interval
//! in milliseconds as a `u32` (nr 2, read/write).

use std::io;
use std::os::unix::io::RawFd;

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;
const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const IOC_MAGIC: u8 = b'p';
const NR_TIMER_STATUS: u8 = 1;
const NR_TIMER_INTERVAL: u8 = 2;

const fn ioctl_code(direction: u32, kind: u8, nr: u8, size: usize) -> libc::c_ulong {
    ((direction << IOC_DIRSHIFT)
        | ((kind as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)) as libc::c_ulong
}

const fn ior<T>(kind: u8, nr: u8) -> libc::c_ulong {
    ioctl_code(IOC_READ, kind, nr, std::mem::size_of::<T>())
}

const fn iow<T>(kind: u8, nr: u8) -> libc::c_ulong {
    ioctl_code(IOC_WRITE, kind, nr, std::mem::size_of::<T>())
}

pub const RD_TIMER_STATUS: libc::c_ulong = ior::<u8>(IOC_MAGIC, NR_TIMER_STATUS);
pub const WR_TIMER_STATUS: libc::c_ulong = iow::<u8>(IOC_MAGIC, NR_TIMER_STATUS);
pub const RD_TIMER_INTERVAL: libc::c_ulong = ior::<u32>(IOC_MAGIC, NR_TIMER_INTERVAL);
pub const WR_TIMER_INTERVAL: libc::c_ulong = iow::<u32>(IOC_MAGIC, NR_TIMER_INTERVAL);

/// # Errors
///
/// Returns the OS error when the ioctl fails.
pub fn read_timer_status(fd: RawFd) -> io::Result<bool> {
    let mut enabled: u8 = 0;
    let rc = unsafe { libc::ioctl(fd, RD_TIMER_STATUS, &mut enabled) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(enabled != 0)
}

/// # Errors
///
/// Returns the OS error when the ioctl fails.
pub fn write_timer_status(fd: RawFd, enabled: bool) -> io::Result<()> {
    let value: u8 = u8::from(enabled);
    let rc = unsafe { libc::ioctl(fd, WR_TIMER_STATUS, &value) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// # Errors
///
/// Returns the OS error when the ioctl fails.
pub fn read_timer_interval(fd: RawFd) -> io::Result<u32> {
    let mut interval_ms: u32 = 0;
    let rc = unsafe { libc::ioctl(fd, RD_TIMER_INTERVAL, &mut interval_ms) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(interval_ms)
}

/// # Errors
///
/// Returns the OS error when the ioctl fails.
pub fn write_timer_interval(fd: RawFd, interval_ms: u32) -> io::Result<()> {
    let rc = unsafe { libc::ioctl(fd, WR_TIMER_INTERVAL, &interval_ms) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Request codes are kernel ABI; the numeric values must never drift.
    #[test]
    fn test_request_code_values() {
        assert_eq!(RD_TIMER_STATUS, 0x8001_7001);
        assert_eq!(WR_TIMER_STATUS, 0x4001_7001);
        assert_eq!(RD_TIMER_INTERVAL, 0x8004_7002);
        assert_eq!(WR_TIMER_INTERVAL, 0x4004_7002);
    }

    #[test]
    fn test_ioctl_on_plain_file_is_rejected() {
        use std::os::unix::io::AsRawFd;

        let file = std::fs::File::open("/dev/null").expect("open /dev/null");
        let result = read_timer_status(file.as_raw_fd());
        assert!(result.is_err(), "/dev/null must not answer timer ioctls");
    }
}
