//! Destinations for streamed body bytes: the flash writer (§4.4) and the
//! buffer writer (§4.5).

use crate::error::{Error, Result};
use crate::ports::FlashDriver;
use crate::proto::SPI_FLASH_SECTOR_SIZE;

/// Where `get_file_ex` (§4.3.2) sends body bytes as they arrive.
pub trait Sink {
    fn accept(&mut self, chunk: &[u8]) -> Result<()>;
    fn collected(&self) -> u32;
}

/// Sector-aligned erase+write with a deferred first byte (§4.4), grounded on
/// the reference's `ota_get_file_ex` flash branch: `writespace` tracks how
/// much of the currently-erased sector is still unwritten, and byte 0 of the
/// whole image is withheld into `first_byte` rather than written, so the
/// slot header stays `0xFF` (an invalid image, per the bootloader's check)
/// until `finalize_file` plants it.
pub struct FlashSink<'a, F: FlashDriver> {
    flash: &'a mut F,
    start_sector: u32,
    writespace: u32,
    collected: u32,
    /// Caches the withheld first byte of the image; lives in the caller
    /// (`OtaCore`) so it survives past this sink's lifetime for
    /// `verify_sign`/`finalize_file` to use.
    first_byte: &'a mut Option<u8>,
}

impl<'a, F: FlashDriver> FlashSink<'a, F> {
    pub fn new(flash: &'a mut F, start_sector: u32, first_byte: &'a mut Option<u8>) -> Self {
        Self { flash, start_sector, writespace: 0, collected: 0, first_byte }
    }
}

impl<'a, F: FlashDriver> Sink for FlashSink<'a, F> {
    fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        let n = chunk.len() as u32;
        if n == 0 {
            return Ok(());
        }

        if self.writespace < n {
            let sector_addr = self.start_sector + self.collected;
            if !self.flash.erase_sector(sector_addr) {
                return Err(Error::FlashErase);
            }
            self.writespace += SPI_FLASH_SECTOR_SIZE;
        }

        if self.collected == 0 {
            *self.first_byte = Some(chunk[0]);
            if !self.flash.write(self.start_sector + 1, &chunk[1..]) {
                return Err(Error::FlashWrite);
            }
        } else if !self.flash.write(self.start_sector + self.collected, chunk) {
            return Err(Error::FlashWrite);
        }

        self.writespace -= n;
        self.collected += n;
        Ok(())
    }

    fn collected(&self) -> u32 {
        self.collected
    }
}

/// Copies body bytes into a caller-supplied buffer (§4.5), appending rather
/// than overwriting so a body split across multiple chunks is not lost (§9,
/// the reference's open question — resolved as append).
pub struct BufferSink<'a> {
    buffer: &'a mut [u8],
    collected: usize,
}

impl<'a> BufferSink<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, collected: 0 }
    }
}

impl<'a> Sink for BufferSink<'a> {
    fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        let end = self.collected + chunk.len();
        if end > self.buffer.len() {
            return Err(Error::BufferOverflow);
        }
        self.buffer[self.collected..end].copy_from_slice(chunk);
        self.collected = end;
        Ok(())
    }

    fn collected(&self) -> u32 {
        self.collected as u32
    }
}
