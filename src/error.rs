//! Unified error type for the OTA core.
//!
//! Mirrors the shape of the teacher firmware's own `ota::Error` /
//! `transport::Error` enums: one flat `Copy` enum per concern, a `Display`
//! impl instead of `std::error::Error`, and `From` conversions so a failure
//! from any layer can propagate with `?` as an `Error`.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// DNS resolution or TCP connect failed.
    DnsOrConnect,
    /// The OS refused to create a new socket.
    SocketCreate,
    /// TLS negotiation failed.
    TlsHandshake,
    /// HTTP status code was not in {200, 206, 302}.
    BadStatus,
    /// Status line or a required header could not be parsed.
    BadResponse,
    /// Redirect budget exhausted before a terminal response was seen.
    RedirectLoop,
    /// Declared content length exceeds `MAXFILESIZE`.
    FileTooBig,
    /// Underlying sector erase failed.
    FlashErase,
    /// Underlying flash write failed.
    FlashWrite,
    /// Underlying flash read failed.
    FlashRead,
    /// Payload larger than the caller-supplied buffer.
    BufferOverflow,
    /// Neither a sector nor a buffer was supplied as a sink.
    InvalidSink,
    /// Bootloader configuration could not be read or written.
    BootloaderConfig,
    /// Compile-time or runtime configuration was missing or invalid.
    Config,
    /// `verify_sign`/`finalize_file` called before a firmware image had been
    /// downloaded into a sector in this session.
    NotStaged,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Error::DnsOrConnect => "DNS resolution or connect failed",
            Error::SocketCreate => "socket create failed",
            Error::TlsHandshake => "TLS handshake failed",
            Error::BadStatus => "unexpected HTTP status",
            Error::BadResponse => "could not parse HTTP response",
            Error::RedirectLoop => "redirect budget exhausted",
            Error::FileTooBig => "declared content length exceeds MAXFILESIZE",
            Error::FlashErase => "flash sector erase failed",
            Error::FlashWrite => "flash write failed",
            Error::FlashRead => "flash read failed",
            Error::BufferOverflow => "payload larger than destination buffer",
            Error::InvalidSink => "neither sector nor buffer supplied",
            Error::BootloaderConfig => "bootloader configuration read/write failed",
            Error::Config => "missing or invalid configuration",
            Error::NotStaged => "no firmware image staged in this session",
        };
        f.write_str(text)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
