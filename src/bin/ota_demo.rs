//! Orchestrator wiring for real ESP32 hardware: boots the chip, then drives
//! an [`OtaCore`] through one version-check/update cycle. Grounded on the
//! teacher's `main.rs` boot sequence (heap init, watchdog, `esp_hal::entry`)
//! and `ota.rs::check()`'s call order, adapted to this codebase's blocking
//! calling convention (§5): no embassy executor, no `spawner.spawn` — one
//! `loop` on the main stack, feeding the watchdog between blocking calls the
//! way the teacher feeds it between `.await` points.

#![no_std]
#![no_main]

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{
    self as hal,
    clock::CpuClock,
    delay::Delay,
    ram,
    rng::Rng,
    timer::timg::{MwdtStage, TimerGroup},
};
use esp_println::logger::init_logger;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

use haa_ota_core::adapters::espidf::{EspBootloader, EspFlash, EspReset};
use haa_ota_core::config::CONFIG;
use haa_ota_core::error::Error;
use haa_ota_core::ports::Network;
use haa_ota_core::proto::{BOOT1SECTOR, SIGNSIZE, VERSIONFILESIZE};
use haa_ota_core::OtaCore;

esp_bootloader_esp_idf::esp_app_desc!();

/// Stands in for a real TCP/DNS adapter over `esp-radio`'s network stack.
///
/// TODO: wire a real `Network` adapter once the blocking-vs-async bridge for
/// `embassy-net`'s genuinely-suspending sockets is built — `crate::block::
/// block_on` only works for I/O that performs a blocking syscall internally
/// and never really awaits, which `embassy-net`'s socket is not.
struct UnwiredNetwork;

struct UnwiredSocket;

impl embedded_io_async::ErrorType for UnwiredSocket {
    type Error = core::convert::Infallible;
}

impl embedded_io_async::Read for UnwiredSocket {
    async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

impl embedded_io_async::Write for UnwiredSocket {
    async fn write(&mut self, _buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

impl Network for UnwiredNetwork {
    type Socket = UnwiredSocket;

    fn tcp_connect(&mut self, _host: &str, _port: u16) -> Result<Self::Socket, Error> {
        Err(Error::DnsOrConnect)
    }
}

#[esp_hal::entry]
fn main() -> ! {
    init_logger(log::LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[ram(reclaimed)] size: 64 * 1024);
    esp_alloc::heap_allocator!(size: 36 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let mut wdt0 = timg0.wdt;
    wdt0.enable();
    wdt0.set_timeout(MwdtStage::Stage0, hal::time::Duration::from_secs(60));

    let rng = Rng::new();
    let mut seed = [0u8; 32];
    for chunk in seed.chunks_mut(4) {
        let random_u32 = rng.random();
        chunk.copy_from_slice(&random_u32.to_le_bytes()[..chunk.len()]);
    }
    let chacha_rng = ChaCha20Rng::from_seed(seed);

    let flash_driver = EspFlash::new(esp_storage::FlashStorage::new(peripherals.FLASH));

    // A second handle onto the same flash peripheral, for the bootloader
    // liaison's partition-table reads/writes. `Peripherals::steal()` is
    // esp-hal's documented escape hatch for exactly this: two software
    // views of one piece of hardware, safe as long as callers don't race
    // each other (the core never calls flash and bootloader methods
    // concurrently — §5, single-threaded cooperative).
    let mut flash_for_bootloader =
        esp_storage::FlashStorage::new(unsafe { esp_hal::peripherals::Peripherals::steal() }.FLASH);
    let mut table_buffer = [0u8; esp_bootloader_esp_idf::partitions::PARTITION_TABLE_MAX_LEN];
    let bootloader = EspBootloader::new(&mut flash_for_bootloader, &mut table_buffer);

    let ota_hostname = match CONFIG.ota_hostname {
        Some(host) => host,
        None => {
            log::error!("no ota_hostname configured; rebooting");
            esp_hal::system::software_reset();
        }
    };
    let ota_port = CONFIG.ota_port.unwrap_or(443);
    let ota_tls = CONFIG.ota_tls;

    let mut ota = OtaCore::new(UnwiredNetwork, flash_driver, bootloader, chacha_rng);
    if let Err(e) = ota.init() {
        log::error!("ota init failed: {e}");
    }

    let mut reset = EspReset::new(Delay::new());

    loop {
        wdt0.feed();

        let mut version = [0u8; VERSIONFILESIZE];
        if let Err(e) = ota.get_version(ota_hostname, "VERSION", ota_port, ota_tls, &mut version) {
            log::warn!("version fetch failed: {e}");
        }

        wdt0.feed();
        // This build targets the boot-image variant (§6, "the updater
        // writes only to the inactive slot at `BOOT1SECTOR` ... or
        // `BOOT0SECTOR`"), so the inactive slot is always `BOOT1SECTOR`.
        // Which slot is active on the next boot is the bootloader's
        // decision, not this core's; activating the new image is out of
        // scope here.
        let sector = BOOT1SECTOR;
        match ota.get_file(ota_hostname, "firmware.bin", sector, ota_port, ota_tls) {
            Ok(filesize) => {
                wdt0.feed();
                let mut sig = [0u8; SIGNSIZE];
                match ota.get_sign(ota_hostname, "firmware.bin", ota_port, ota_tls, &mut sig) {
                    Ok(sig_len) => {
                        if ota.verify_sign(sector, filesize, &sig[..sig_len]).is_ok() {
                            ota.finalize_file(sector).ok();
                            ota.reboot(&mut reset);
                        } else {
                            log::error!("signature verification failed");
                        }
                    }
                    Err(e) => log::error!("signature fetch failed: {e}"),
                }
            }
            Err(e) => log::warn!("firmware fetch failed: {e}"),
        }

        for _ in 0..3600 {
            Delay::new().delay_millis(1000);
            wdt0.feed();
        }
    }
}
