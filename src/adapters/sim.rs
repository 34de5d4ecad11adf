//! In-memory fakes for host tests: a byte-array flash, an in-memory boot
//! record, a fixed clock, and a reset stub that panics instead of actually
//! restarting. Network is deliberately not simulated here — `crate::fetch`'s
//! own tests script a `Network` impl per scenario instead, since what matters
//! there is the exact byte sequence a peer sends, not a generic fake.

extern crate std;

use std::vec;
use std::vec::Vec;

use crate::ports::{BootloaderConfig, Clock, FlashDriver, RomConfig, SystemReset};
use crate::proto::SPI_FLASH_SECTOR_SIZE;

/// A flat byte array standing in for raw NOR flash. Erase fills a sector with
/// `0xFF`, matching real flash's erased-high convention (the convention
/// `crate::sink::FlashSink`'s withheld-first-byte trick depends on).
pub struct SimFlash {
    data: Vec<u8>,
}

impl SimFlash {
    pub fn new(size: usize) -> Self {
        Self { data: vec![0xFFu8; size] }
    }
}

impl FlashDriver for SimFlash {
    fn erase_sector(&mut self, addr: u32) -> bool {
        let start = addr as usize;
        let end = start + SPI_FLASH_SECTOR_SIZE as usize;
        match self.data.get_mut(start..end) {
            Some(region) => {
                region.fill(0xFF);
                true
            }
            None => false,
        }
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> bool {
        let start = addr as usize;
        match self.data.get(start..start + buf.len()) {
            Some(region) => {
                buf.copy_from_slice(region);
                true
            }
            None => false,
        }
    }

    fn write(&mut self, addr: u32, buf: &[u8]) -> bool {
        let start = addr as usize;
        match self.data.get_mut(start..start + buf.len()) {
            Some(region) => {
                region.copy_from_slice(buf);
                true
            }
            None => false,
        }
    }
}

/// In-memory two-slot boot record.
pub struct SimBootloader {
    config: RomConfig,
}

impl SimBootloader {
    pub fn new(config: RomConfig) -> Self {
        Self { config }
    }
}

impl BootloaderConfig for SimBootloader {
    fn get_config(&mut self) -> RomConfig {
        self.config
    }

    fn set_config(&mut self, config: &RomConfig) -> bool {
        self.config = *config;
        true
    }
}

/// A clock pinned to a fixed instant, for deterministic tests.
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn unix_time(&self) -> u64 {
        self.0
    }
}

/// Records that a reset was requested instead of actually restarting, so a
/// test can assert `reboot()` was reached without tearing down the process.
pub struct RecordingReset {
    pub delays_ms: Vec<u32>,
}

impl RecordingReset {
    pub fn new() -> Self {
        Self { delays_ms: Vec::new() }
    }
}

impl Default for RecordingReset {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemReset for RecordingReset {
    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }

    fn reset(&mut self) -> ! {
        panic!("RecordingReset::reset called");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_flash_erase_sets_sector_to_erased_value() {
        let mut flash = SimFlash::new(2 * SPI_FLASH_SECTOR_SIZE as usize);
        assert!(flash.write(0, &[1, 2, 3]));
        assert!(flash.erase_sector(0));
        let mut buf = [0u8; 3];
        flash.read(0, &mut buf);
        assert_eq!(buf, [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn sim_bootloader_round_trips_config() {
        let mut bootloader = SimBootloader::new(RomConfig { count: 2, roms: [0x1000, 0x2000], current_rom: 0 });
        let config = RomConfig { count: 2, roms: [0x3000, 0x4000], current_rom: 0 };
        assert!(bootloader.set_config(&config));
        assert_eq!(bootloader.get_config().roms, [0x3000, 0x4000]);
    }
}
