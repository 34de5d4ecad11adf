//! The public surface (§5, §6): one struct, constructed once by the
//! orchestrator and threaded through every call, grounded on the teacher's
//! `Ota<'a>` (`ota.rs`) — a single struct holding its static buffers, with
//! `&mut self` methods called from one cooperative task.

use rand_core::{CryptoRng, RngCore};

use crate::bootloader;
use crate::error::{Error, Result};
use crate::fetch::{self, ResolvedLocation};
use crate::ports::{BootloaderConfig, FlashDriver, Network, SystemReset};
use crate::proto::{REBOOT_DELAY_MS, SIGNFILESUFIX, SIGNSIZE, TLS_BUFFER_MAX, VERSIONFILESIZE};
use crate::sink::{BufferSink, FlashSink};
use crate::verify;

/// One `OtaCore` is created per device boot and threaded through every fetch
/// (§9, "Static singletons" — resolved as fields of one struct rather than
/// C-style globals).
pub struct OtaCore<N, F, B, RNG> {
    net: N,
    flash: F,
    bootloader: B,
    rng: RNG,
    tls_read_buf: [u8; TLS_BUFFER_MAX],
    tls_write_buf: [u8; TLS_BUFFER_MAX],
    /// The withheld first byte of the image currently staged in flash, if
    /// any. Populated by `get_file`, consumed by `verify_sign`/
    /// `finalize_file`.
    first_byte: Option<u8>,
}

impl<N, F, B, RNG> OtaCore<N, F, B, RNG>
where
    N: Network,
    F: FlashDriver,
    B: BootloaderConfig,
    RNG: CryptoRng + RngCore,
{
    pub fn new(net: N, flash: F, bootloader: B, rng: RNG) -> Self {
        Self {
            net,
            flash,
            bootloader,
            rng,
            tls_read_buf: [0u8; TLS_BUFFER_MAX],
            tls_write_buf: [0u8; TLS_BUFFER_MAX],
            first_byte: None,
        }
    }

    /// Normalizes the boot configuration to a well-formed two-slot layout.
    /// Idempotent (§6).
    pub fn init(&mut self) -> Result<()> {
        log::info!("INIT");
        bootloader::normalize_config(&mut self.bootloader)?;
        Ok(())
    }

    /// Streams `file` from `repo` into flash at `sector`, returning the
    /// number of bytes written.
    pub fn get_file(&mut self, repo: &str, file: &str, sector: u32, port: u16, tls: bool) -> Result<u32> {
        log::info!("DOWNLOADING FILE {file}");
        let resolved = self.resolve(repo, file, port, tls)?;

        let mut first_byte = None;
        let mut sink = FlashSink::new(&mut self.flash, sector, &mut first_byte);
        let n = fetch::get_file_ex(
            &mut self.net,
            &mut self.rng,
            &resolved,
            port,
            tls,
            &mut self.tls_read_buf,
            &mut self.tls_write_buf,
            &mut sink,
            true,
        )?;
        self.first_byte = first_byte;
        log::info!("Received {n} bytes");
        Ok(n)
    }

    /// Fetches a small ASCII version file into `out`, returning how many
    /// bytes were written.
    pub fn get_version(&mut self, repo: &str, file: &str, port: u16, tls: bool, out: &mut [u8; VERSIONFILESIZE]) -> Result<usize> {
        let resolved = self.resolve(repo, file, port, tls)?;
        let mut sink = BufferSink::new(out);
        let n = fetch::get_file_ex(
            &mut self.net,
            &mut self.rng,
            &resolved,
            port,
            tls,
            &mut self.tls_read_buf,
            &mut self.tls_write_buf,
            &mut sink,
            false,
        )?;
        Ok(n as usize)
    }

    /// Fetches `<file><SIGNFILESUFIX>`'s signature bytes into `sig_out`.
    pub fn get_sign(&mut self, repo: &str, file: &str, port: u16, tls: bool, sig_out: &mut [u8; SIGNSIZE]) -> Result<usize> {
        let mut sig_file = heapless::String::<80>::new();
        sig_file.push_str(file).map_err(|_| Error::BadResponse)?;
        sig_file.push_str(SIGNFILESUFIX).map_err(|_| Error::BadResponse)?;

        let resolved = self.resolve(repo, &sig_file, port, tls)?;
        let mut sink = BufferSink::new(sig_out);
        let n = fetch::get_file_ex(
            &mut self.net,
            &mut self.rng,
            &resolved,
            port,
            tls,
            &mut self.tls_read_buf,
            &mut self.tls_write_buf,
            &mut sink,
            false,
        )?;
        Ok(n as usize)
    }

    fn resolve(&mut self, repo: &str, file: &str, port: u16, tls: bool) -> Result<ResolvedLocation> {
        fetch::resolve_final_location(
            &mut self.net,
            &mut self.rng,
            repo,
            file,
            port,
            tls,
            &mut self.tls_read_buf,
            &mut self.tls_write_buf,
        )
    }

    /// Hashes the staged image and checks `sig` against it. `Ok(())` means
    /// valid; `Err` covers both a malformed signature and a mismatch (§4.6).
    pub fn verify_sign(&mut self, start_sector: u32, filesize: u32, sig: &[u8]) -> Result<()> {
        let first_byte = self.first_byte.ok_or(Error::NotStaged)?;
        let digest = verify::hash_image(&mut self.flash, start_sector, filesize, first_byte)?;
        let result = verify::verify_signature(&digest, sig);
        log::info!("Sign result: {}", if result.is_ok() { "OK" } else { "ERROR" });
        result
    }

    /// Plants the withheld first byte, arming the staged image to pass the
    /// bootloader's magic-byte check. Must only be called after
    /// `verify_sign` returns `Ok`.
    pub fn finalize_file(&mut self, sector: u32) -> Result<()> {
        let first_byte = self.first_byte.ok_or(Error::NotStaged)?;
        bootloader::finalize_file(&mut self.flash, sector, first_byte)?;
        self.first_byte = None;
        Ok(())
    }

    /// Waits briefly for log output to flush, then restarts the system.
    /// Never returns.
    pub fn reboot<R: SystemReset>(&self, reset: &mut R) -> ! {
        log::info!("Rebooting");
        reset.delay_ms(REBOOT_DELAY_MS);
        reset.reset()
    }
}
