//! Narrow trait boundaries toward the core's external collaborators (§6).
//!
//! The core is generic over these traits the way the pack's
//! `ZanzyTHEbar-pet-filter/firmware/src/app/ports.rs` defines `SensorPort`,
//! `ActuatorPort`, `ConfigPort`, etc.: one trait per collaborator, a
//! production adapter behind `#[cfg(target_os = "espidf")]`, and a plain
//! in-memory adapter for host tests (`crate::adapters::sim`). The logger
//! collaborator has no trait of its own, the same way the teacher never wraps
//! `log` in a port either — callers install a `log::Log` implementation and
//! the core calls the facade macros directly.

/// Raw sector-addressed flash access: erase, read, write.
///
/// Implemented for real hardware by wrapping `embedded_storage::nor_flash::
/// NorFlash` (the trait the teacher's `ota.rs` already drives its
/// `next_app_partition.erase()` / `.write()` calls through), and by an
/// in-memory byte array for tests.
pub trait FlashDriver {
    /// Erases one sector at `addr`. `addr` must be sector-aligned.
    fn erase_sector(&mut self, addr: u32) -> bool;
    /// Reads `buf.len()` bytes starting at `addr`.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> bool;
    /// Writes `buf` starting at `addr`. Does not erase first.
    fn write(&mut self, addr: u32, buf: &[u8]) -> bool;
}

/// Two-slot rboot-style boot configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomConfig {
    pub count: u8,
    pub roms: [u32; 2],
    pub current_rom: u8,
}

/// Bootloader configuration access (§4.7). Out of scope for this core: the
/// core only normalizes the record, it never implements slot switching
/// itself.
pub trait BootloaderConfig {
    fn get_config(&mut self) -> RomConfig;
    fn set_config(&mut self, config: &RomConfig) -> bool;
}

/// The TCP/IP stack: DNS resolution plus a stream socket (§1 lists this as
/// out of scope; the core only ever touches it through this trait). The
/// associated `Socket` type is what the transport layer wraps in a TLS
/// session when requested.
pub trait Network {
    type Socket: embedded_io_async::Read + embedded_io_async::Write + embedded_io_async::ErrorType;

    /// Resolves `host` and opens a connected stream socket to `host:port`.
    fn tcp_connect(&mut self, host: &str, port: u16) -> Result<Self::Socket, crate::error::Error>;
}

/// Absolute time source, already synchronized by NTP before any TLS fetch is
/// attempted (§6). The core does not use this for certificate validation
/// itself — certificate verification is deliberately disabled (§9) — but the
/// TLS stack it is handed may consult a clock, and the orchestrator is
/// responsible for making sure that clock is correct first.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn unix_time(&self) -> u64;
}

/// System restart primitive backing the public `reboot()` operation (§4.7,
/// §6), grounded on the teacher's `Timer::after(..).await` grace delay
/// followed by `esp_hal::system::software_reset()` in `ota.rs::check()`.
pub trait SystemReset {
    /// Blocks for approximately `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
    /// Triggers a system restart. Does not return.
    fn reset(&mut self) -> !;
}
