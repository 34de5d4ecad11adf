//! Protocol and flash-geometry constants.
//!
//! `header.h` from the original firmware (which defined most of these) was not
//! part of the retrieved source; the values below are chosen to be consistent
//! with typical ESP8266/ESP32 flash geometry and the hash/signature sizes the
//! rest of the design implies. See `DESIGN.md` for the full rationale.

/// Maximum length of a host name accepted by the URL splitter.
pub const HOST_LEN: usize = 64;

/// Scratch receive buffer used while resolving redirects and parsing headers.
pub const RECV_BUF_LEN: usize = 512;

/// Upper bound on how much header data `resolve_final_location` will
/// accumulate before giving up on growing its buffer further.
pub const HEADER_BUFFER_LEN: usize = 2048;

/// Bound on the number of `302` redirects a single fetch will follow.
pub const MAX_302_JUMPS: u8 = 5;

/// Size, in bytes, of a DER-encoded ECDSA P-384 signature (SEQUENCE of two
/// INTEGERs, each up to 49 bytes with sign-padding, plus headers).
pub const SIGNSIZE: usize = 104;

/// Size, in bytes, of a SHA-384 digest.
pub const HASHSIZE: usize = 48;

/// Suffix appended to a firmware file name to name its companion signature file.
pub const SIGNFILESUFIX: &str = ".sig";

/// Maximum size of a version string fetched by `get_version`.
pub const VERSIONFILESIZE: usize = 64;

/// Flash erase granularity.
pub const SPI_FLASH_SECTOR_SIZE: u32 = 4096;

/// Offset of ROM slot 0.
pub const BOOT0SECTOR: u32 = 0x0002_0000;

/// Offset of ROM slot 1.
pub const BOOT1SECTOR: u32 = 0x0012_0000;

/// Offset of the one-sector commit sidecar used outside the boot-stage build.
pub const SPIFLASH_BASE_ADDR: u32 = 0x0022_0000;

/// Largest firmware image the updater will accept: the non-boot-stage slot
/// size minus a small safety margin, matching the reference's
/// `(BOOT1SECTOR - BOOT0SECTOR) - 16` formula.
pub const MAXFILESIZE: u32 = (BOOT1SECTOR - BOOT0SECTOR) - 16;

/// Number of bytes requested per ranged GET while streaming a file.
pub const CHUNK_SIZE: u32 = 4096;

/// Receive timeout applied to the underlying socket, in milliseconds.
pub const RECV_TIMEOUT_MS: u64 = 1200;

/// Size of the read/write scratch buffers handed to the TLS session, matching
/// the teacher's `constants.rs::TLS_BUFFER_MAX`.
pub const TLS_BUFFER_MAX: usize = 16640;

/// Grace period `reboot` waits before resetting, for log output to flush.
pub const REBOOT_DELAY_MS: u32 = 1000;

/// ECDSA P-384 public key used to verify firmware signatures, encoded as a
/// SubjectPublicKeyInfo DER document. Compiled in; never changes at runtime.
pub const PUBLIC_KEY_DER: [u8; 120] = [
    0x30, 0x76, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05,
    0x2b, 0x81, 0x04, 0x00, 0x22, 0x03, 0x62, 0x00, 0x04, 0x98, 0xe0, 0x54, 0xc4, 0x9b, 0x8a,
    0x41, 0x94, 0x76, 0xd1, 0x7f, 0xfd, 0xdf, 0x7b, 0xc4, 0xcc, 0x8f, 0x97, 0x37, 0x89, 0x31,
    0xd5, 0x17, 0x99, 0xe8, 0x0f, 0x94, 0x3a, 0x85, 0x21, 0x09, 0xc6, 0xaa, 0xee, 0xb0, 0xee,
    0x58, 0x29, 0xb1, 0x14, 0x6d, 0x8f, 0x37, 0xcd, 0x01, 0x23, 0x2f, 0xbf, 0x75, 0x3b, 0x70,
    0xc2, 0xb9, 0x3f, 0x30, 0x4d, 0x88, 0xf4, 0xc6, 0x5f, 0x8c, 0x24, 0x8a, 0x02, 0xd4, 0xce,
    0x65, 0x64, 0x24, 0xc2, 0x6d, 0xd2, 0x2c, 0x11, 0x95, 0x08, 0x00, 0x5d, 0x4d, 0x9a, 0x9f,
    0x1d, 0xab, 0x91, 0xf4, 0x04, 0x66, 0x30, 0x94, 0x56, 0x3b, 0x4c, 0xb7, 0xba, 0xdb, 0x22,
];

/// Magic bytes used by the optional commit sidecar: `magic[1]` records a
/// passing verification, `magic[2]` records end-of-sequence.
pub const COMMIT_MAGIC: [u8; 3] = *b"HAP";
