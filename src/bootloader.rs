//! The liaison between the core and the two-slot boot configuration (§4.7),
//! plus the final commit step that plants the withheld first byte and the
//! optional commit sidecar, grounded on the reference's `ota_init` slot-table
//! check, `ota_finalize_file`, `sign_check_client`'s magic-byte sidecar
//! write, and `ota_reboot`.
//!
//! Slot selection itself — which of `BOOT0SECTOR`/`BOOT1SECTOR` is the
//! inactive slot to write to — is out of scope for the core (§1, §6): the
//! reference never sets `current_rom` to anything but `0`, and the real
//! slot-select mechanism lives entirely in the bootloader this core only
//! liaises with. The destination sector is a static build-variant choice
//! (§6, "writes only to the inactive slot at `BOOT1SECTOR` ... or
//! `BOOT0SECTOR`"), not something this module computes at runtime.

use crate::error::{Error, Result};
use crate::ports::{BootloaderConfig, FlashDriver, RomConfig};
use crate::proto::{BOOT0SECTOR, BOOT1SECTOR, COMMIT_MAGIC};

/// Reads the boot configuration and, if it does not already describe the
/// expected two-slot layout with slot 0 active, overwrites it with
/// `{count=2, roms=[BOOT0SECTOR, BOOT1SECTOR], current_rom=0}` (§4.7),
/// mirroring the reference's `conf.count != 2 || conf.roms[0] !=
/// BOOT0SECTOR || conf.roms[1] != BOOT1SECTOR || conf.current_rom != 0`
/// check in `ota_init`.
pub fn normalize_config<B: BootloaderConfig>(bootloader: &mut B) -> Result<RomConfig> {
    let mut config = bootloader.get_config();
    let well_formed = config.count == 2
        && config.roms[0] == BOOT0SECTOR
        && config.roms[1] == BOOT1SECTOR
        && config.current_rom == 0;

    if !well_formed {
        config = RomConfig { count: 2, roms: [BOOT0SECTOR, BOOT1SECTOR], current_rom: 0 };
        if !bootloader.set_config(&config) {
            return Err(Error::BootloaderConfig);
        }
    }
    Ok(config)
}

/// Plants the withheld first byte onto flash, turning the slot header from
/// the erased `0xFF` marker into a valid image header (§4.4, §4.7). This is
/// the only step that makes a newly written image bootable; everything
/// before it is invisible to the bootloader.
pub fn finalize_file<F: FlashDriver>(flash: &mut F, start_sector: u32, first_byte: u8) -> Result<()> {
    if !flash.write(start_sector, &[first_byte]) {
        return Err(Error::FlashWrite);
    }
    Ok(())
}

/// Writes the optional one-sector commit sidecar, grounded on the
/// reference's `sign_check_client`: the third byte of the sidecar records
/// the outcome, taking the value `COMMIT_MAGIC[1]` ('A') on a passing
/// verification or `COMMIT_MAGIC[2]` ('P') otherwise — the first two bytes
/// never change. Only meaningful for builds that keep a sidecar sector
/// outside the two ROM slots (`proto::SPIFLASH_BASE_ADDR`); harmless to skip
/// for builds that don't.
pub fn write_commit_sidecar<F: FlashDriver>(flash: &mut F, sidecar_sector: u32, passed: bool) -> Result<()> {
    if !flash.erase_sector(sidecar_sector) {
        return Err(Error::FlashErase);
    }
    let mut magic = COMMIT_MAGIC;
    magic[2] = if passed { COMMIT_MAGIC[1] } else { COMMIT_MAGIC[2] };
    if !flash.write(sidecar_sector, &magic) {
        return Err(Error::FlashWrite);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBootloader {
        config: RomConfig,
        set_calls: std::vec::Vec<RomConfig>,
    }

    impl BootloaderConfig for FakeBootloader {
        fn get_config(&mut self) -> RomConfig {
            self.config
        }
        fn set_config(&mut self, config: &RomConfig) -> bool {
            self.config = *config;
            self.set_calls.push(*config);
            true
        }
    }

    struct FakeFlash {
        data: std::vec::Vec<u8>,
        erased: std::vec::Vec<u32>,
    }

    impl FlashDriver for FakeFlash {
        fn erase_sector(&mut self, addr: u32) -> bool {
            self.erased.push(addr);
            true
        }
        fn read(&mut self, addr: u32, buf: &mut [u8]) -> bool {
            let start = addr as usize;
            buf.copy_from_slice(&self.data[start..start + buf.len()]);
            true
        }
        fn write(&mut self, addr: u32, buf: &[u8]) -> bool {
            let start = addr as usize;
            self.data[start..start + buf.len()].copy_from_slice(buf);
            true
        }
    }

    #[test]
    fn normalize_config_leaves_a_well_formed_config_untouched() {
        let mut bootloader = FakeBootloader {
            config: RomConfig { count: 2, roms: [BOOT0SECTOR, BOOT1SECTOR], current_rom: 0 },
            set_calls: std::vec::Vec::new(),
        };
        let config = normalize_config(&mut bootloader).unwrap();
        assert_eq!(config.count, 2);
        assert!(bootloader.set_calls.is_empty());
    }

    #[test]
    fn normalize_config_fixes_a_bad_slot_count() {
        let mut bootloader =
            FakeBootloader { config: RomConfig { count: 1, roms: [0x1000, 0x2000], current_rom: 5 }, set_calls: std::vec::Vec::new() };
        let config = normalize_config(&mut bootloader).unwrap();
        assert_eq!(config.count, 2);
        assert_eq!(config.roms, [BOOT0SECTOR, BOOT1SECTOR]);
        assert_eq!(config.current_rom, 0);
        assert_eq!(bootloader.set_calls.len(), 1);
    }

    #[test]
    fn normalize_config_fixes_wrong_slot_offsets_even_when_count_is_right() {
        let mut bootloader = FakeBootloader {
            config: RomConfig { count: 2, roms: [0, 0], current_rom: 1 },
            set_calls: std::vec::Vec::new(),
        };
        let config = normalize_config(&mut bootloader).unwrap();
        assert_eq!(config.roms, [BOOT0SECTOR, BOOT1SECTOR]);
        assert_eq!(config.current_rom, 0);
        assert_eq!(bootloader.set_calls.len(), 1);
    }

    #[test]
    fn finalize_file_writes_the_withheld_byte() {
        let mut flash = FakeFlash { data: std::vec![0xFFu8; 4096], erased: std::vec::Vec::new() };
        finalize_file(&mut flash, 0, 0xE9).unwrap();
        assert_eq!(flash.data[0], 0xE9);
    }

    #[test]
    fn write_commit_sidecar_encodes_pass_in_the_third_byte() {
        let mut flash = FakeFlash { data: std::vec![0u8; 4096], erased: std::vec::Vec::new() };
        write_commit_sidecar(&mut flash, 0, true).unwrap();
        assert_eq!(&flash.data[0..3], &[COMMIT_MAGIC[0], COMMIT_MAGIC[1], COMMIT_MAGIC[1]]);
        assert_eq!(flash.erased, std::vec![0]);
    }

    #[test]
    fn write_commit_sidecar_encodes_fail_in_the_third_byte() {
        let mut flash = FakeFlash { data: std::vec![0u8; 4096], erased: std::vec::Vec::new() };
        write_commit_sidecar(&mut flash, 0, false).unwrap();
        assert_eq!(&flash.data[0..3], &COMMIT_MAGIC);
    }
}
