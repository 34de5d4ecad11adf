//! The HTTP fetcher: redirect resolution (§4.3.1) and the ranged streaming
//! download loop (§4.3.2), grounded on the reference's
//! `ota_get_final_location` / `ota_get_file_ex` and on the teacher's
//! `ota.rs::check()` header-accumulation loop (`find_header_end`, growing a
//! buffer until `\r\n\r\n` is seen).

use heapless::Vec as HVec;
use rand_core::{CryptoRng, RngCore};

use crate::error::{Error, Result};
use crate::header;
use crate::ports::Network;
use crate::proto::{CHUNK_SIZE, HEADER_BUFFER_LEN, MAXFILESIZE, MAX_302_JUMPS, RECV_BUF_LEN};
use crate::sink::Sink;
use crate::transport::Connection;
use crate::url::{join_location, split_repo, Host, Location};

/// Result of following redirects to a terminal 200/206 response (§4.3.1).
#[derive(Debug)]
pub struct ResolvedLocation {
    pub host: Host,
    pub location: Location,
}

fn build_range_request(buf: &mut HVec<u8, HEADER_BUFFER_LEN>, location: &str, host: &str, lo: u32, hi: u32) {
    buf.clear();
    let _ = buf.extend_from_slice(b"GET /");
    let _ = buf.extend_from_slice(location.as_bytes());
    let _ = buf.extend_from_slice(b" HTTP/1.1\r\nHost: ");
    let _ = buf.extend_from_slice(host.as_bytes());
    let _ = buf.extend_from_slice(b"\r\nRange: bytes=");
    push_u32(buf, lo);
    let _ = buf.push(b'-');
    push_u32(buf, hi);
    let _ = buf.extend_from_slice(b"\r\n\r\n");
}

fn push_u32(buf: &mut HVec<u8, HEADER_BUFFER_LEN>, mut n: u32) {
    let mut digits = [0u8; 10];
    let mut i = digits.len();
    if n == 0 {
        let _ = buf.push(b'0');
        return;
    }
    while n > 0 {
        i -= 1;
        digits[i] = b'0' + (n % 10) as u8;
        n /= 10;
    }
    let _ = buf.extend_from_slice(&digits[i..]);
}

/// Issues a ranged `bytes=0-1` GET to the current `host/location`, following
/// `302` redirects (including protocol-relative `Location:` targets) until a
/// terminal `200`/`206` response, up to `MAX_302_JUMPS` hops (§4.3.1).
pub fn resolve_final_location<N, RNG>(
    net: &mut N,
    rng: &mut RNG,
    repo: &str,
    file: &str,
    port: u16,
    tls: bool,
    tls_read_buf: &mut [u8],
    tls_write_buf: &mut [u8],
) -> Result<ResolvedLocation>
where
    N: Network,
    RNG: CryptoRng + RngCore,
{
    let (mut host, first_location) = split_repo(repo);
    let mut location = join_location(&first_location, file);

    let mut req = HVec::<u8, HEADER_BUFFER_LEN>::new();
    let mut header_buf = HVec::<u8, HEADER_BUFFER_LEN>::new();
    let mut scratch = [0u8; RECV_BUF_LEN];

    for _ in 0..MAX_302_JUMPS {
        log::info!("Forwarding: {}/{}", host.as_str(), location.as_str());
        build_range_request(&mut req, location.as_str(), host.as_str(), 0, 1);

        let mut conn: Connection<N::Socket> =
            Connection::connect(net, rng, host.as_str(), port, tls, tls_read_buf, tls_write_buf)?;
        conn.send(&req)?;

        header_buf.clear();
        loop {
            let n = conn.recv(&mut scratch)?;
            if n == 0 {
                break;
            }
            if header_buf.extend_from_slice(&scratch[..n]).is_err() {
                break; // hit HEADER_BUFFER_LEN; parse what we have (§4.3.1)
            }
            if header::find_header_end(&header_buf).is_some() {
                break;
            }
        }

        let status = header::parse_status_code(&header_buf).ok_or(Error::BadResponse)?;
        match status {
            200 | 206 => return Ok(ResolvedLocation { host, location }),
            302 => {
                let target = header::parse_location(&header_buf).ok_or(Error::BadResponse)?;
                let target = core::str::from_utf8(target).map_err(|_| Error::BadResponse)?;
                let (new_host, new_location) = split_repo(target);
                host = new_host;
                location = new_location;
            }
            _ => return Err(Error::BadStatus),
        }
    }

    Err(Error::RedirectLoop)
}

/// Streams `file` from the already-resolved `host/location` into `sink`,
/// issuing 4 KiB ranged GETs and reconnecting transparently on mid-stream
/// peer close (§4.3.2). Returns the total number of bytes dispatched to
/// `sink`.
#[allow(clippy::too_many_arguments)]
pub fn get_file_ex<N, RNG, S>(
    net: &mut N,
    rng: &mut RNG,
    resolved: &ResolvedLocation,
    port: u16,
    tls: bool,
    tls_read_buf: &mut [u8],
    tls_write_buf: &mut [u8],
    sink: &mut S,
    sink_requires_content_range: bool,
) -> Result<u32>
where
    N: Network,
    RNG: CryptoRng + RngCore,
    S: Sink,
{
    let mut req = HVec::<u8, HEADER_BUFFER_LEN>::new();
    let mut header_buf = HVec::<u8, HEADER_BUFFER_LEN>::new();
    let mut scratch = [0u8; RECV_BUF_LEN];

    let mut collected: u32 = 0;
    let mut total: u32 = 1; // seeded so the first iteration runs (§4.3.2 step 3)

    let mut conn: Connection<N::Socket> = Connection::connect(
        net,
        rng,
        resolved.host.as_str(),
        port,
        tls,
        tls_read_buf,
        tls_write_buf,
    )?;

    while collected < total {
        let hi = collected + CHUNK_SIZE - 1;
        build_range_request(&mut req, resolved.location.as_str(), resolved.host.as_str(), collected, hi);
        conn.send(&req)?;

        // Headers may straddle more than one `recv()`, so they are
        // accumulated into `header_buf` the same way `resolve_final_location`
        // accumulates its probe response, rather than scanning one fragment
        // at a time the way the body loop below does.
        header_buf.clear();
        let mut recv_bytes: u32 = 0;
        let mut header_end = None;

        while header_end.is_none() {
            let n = conn.recv(&mut scratch)?;
            if n == 0 {
                return Err(Error::BadResponse);
            }
            if header_buf.extend_from_slice(&scratch[..n]).is_err() {
                return Err(Error::BadResponse);
            }
            header_end = header::find_header_end(&header_buf);
        }
        let header_end = header_end.unwrap();
        let headers = &header_buf[..header_end];

        let clength = header::parse_content_length(headers).ok_or(Error::BadResponse)?;
        total = match header::parse_content_range_total(headers) {
            Some(z) => z,
            None if !sink_requires_content_range => clength,
            None => return Err(Error::BadResponse),
        };

        if total > MAXFILESIZE {
            return Err(Error::FileTooBig);
        }

        let leading_body_len = header_buf.len() - header_end;
        if leading_body_len > 0 {
            let mut leading_body = [0u8; HEADER_BUFFER_LEN];
            leading_body[..leading_body_len].copy_from_slice(&header_buf[header_end..]);
            let chunk = &leading_body[..leading_body_len];
            recv_bytes += chunk.len() as u32;
            sink.accept(chunk)?;
            collected += chunk.len() as u32;
        }

        while recv_bytes < clength {
            let n = conn.recv(&mut scratch)?;
            if n == 0 {
                if collected < total {
                    // Mid-stream reconnection (§4.3.2): reconnect and resume
                    // from `collected`; the resolver is not re-run.
                    conn = Connection::connect(
                        net,
                        rng,
                        resolved.host.as_str(),
                        port,
                        tls,
                        tls_read_buf,
                        tls_write_buf,
                    )?;
                }
                break;
            }

            let body = &scratch[..n];
            recv_bytes += body.len() as u32;
            sink.accept(body)?;
            collected += body.len() as u32;
        }
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// A canned sequence of TCP "connections", each a pre-scripted response.
    /// Stands in for `crate::ports::Network` the way a loopback pair would,
    /// without requiring a real socket in unit tests.
    struct ScriptedSocket {
        remaining: VecDeque<Vec<u8>>,
    }

    impl embedded_io_async::ErrorType for ScriptedSocket {
        type Error = core::convert::Infallible;
    }

    impl embedded_io_async::Read for ScriptedSocket {
        async fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
            match self.remaining.pop_front() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        let mut rest = chunk;
                        rest.drain(..n);
                        self.remaining.push_front(rest);
                    }
                    Ok(n)
                }
                None => Ok(0),
            }
        }
    }

    impl embedded_io_async::Write for ScriptedSocket {
        async fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
            Ok(buf.len())
        }
    }

    struct ScriptedNetwork {
        connections: VecDeque<VecDeque<Vec<u8>>>,
    }

    impl Network for ScriptedNetwork {
        type Socket = ScriptedSocket;

        fn tcp_connect(&mut self, _host: &str, _port: u16) -> Result<Self::Socket> {
            let remaining = self.connections.pop_front().unwrap_or_default();
            Ok(ScriptedSocket { remaining })
        }
    }

    fn packets(bodies: &[&[u8]]) -> VecDeque<Vec<u8>> {
        bodies.iter().map(|b| b.to_vec()).collect()
    }

    #[test]
    fn resolve_follows_a_protocol_relative_redirect() {
        let mut net = ScriptedNetwork {
            connections: [
                packets(&[b"HTTP/1.1 302 Found\r\nLocation: //b.example/v2\r\n\r\n"]),
                packets(&[b"HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\n1.2.3\n"]),
            ]
            .into_iter()
            .collect(),
        };
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        let mut rx = [0u8; 64];
        let mut tx = [0u8; 64];

        let resolved =
            resolve_final_location(&mut net, &mut rng, "a.example/v", "", 80, false, &mut rx, &mut tx).unwrap();

        assert_eq!(resolved.host.as_str(), "b.example");
        assert_eq!(resolved.location.as_str(), "v2");
    }

    #[test]
    fn resolve_gives_up_after_max_redirects() {
        let loop_response = || packets(&[b"HTTP/1.1 302 Found\r\nLocation: //self.example/x\r\n\r\n"]);
        let mut net = ScriptedNetwork {
            connections: (0..MAX_302_JUMPS as usize + 1).map(|_| loop_response()).collect(),
        };
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        let mut rx = [0u8; 64];
        let mut tx = [0u8; 64];

        let result = resolve_final_location(&mut net, &mut rng, "self.example/x", "", 80, false, &mut rx, &mut tx);
        assert_eq!(result.unwrap_err(), Error::RedirectLoop);
    }

    #[test]
    fn get_file_ex_reads_body_split_across_segments_into_buffer_sink() {
        let mut net = ScriptedNetwork {
            connections: [packets(&[
                b"HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\n",
                b"1.2.3\n",
            ])]
            .into_iter()
            .collect(),
        };
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        let mut rx = [0u8; 64];
        let mut tx = [0u8; 64];
        let resolved = ResolvedLocation { host: "a.example".parse().unwrap_or_default(), location: Default::default() };
        let mut buf = [0u8; 16];
        let mut sink = BufferSink::new(&mut buf);

        let n = get_file_ex(&mut net, &mut rng, &resolved, 80, false, &mut rx, &mut tx, &mut sink, false).unwrap();
        assert_eq!(n, 6);
        assert_eq!(&buf[..6], b"1.2.3\n");
    }

    #[test]
    fn get_file_ex_reassembles_headers_split_across_reads() {
        // The "\r\n\r\n" terminator itself is split across two fragments, so
        // a single-fragment scan would never see it.
        let mut net = ScriptedNetwork {
            connections: [packets(&[
                b"HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r",
                b"\n1.2.3\n",
            ])]
            .into_iter()
            .collect(),
        };
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        let mut rx = [0u8; 64];
        let mut tx = [0u8; 64];
        let resolved = ResolvedLocation { host: Default::default(), location: Default::default() };
        let mut buf = [0u8; 16];
        let mut sink = BufferSink::new(&mut buf);

        let n = get_file_ex(&mut net, &mut rng, &resolved, 80, false, &mut rx, &mut tx, &mut sink, false).unwrap();
        assert_eq!(n, 6);
        assert_eq!(&buf[..6], b"1.2.3\n");
    }

    #[test]
    fn get_file_ex_requires_content_range_for_flash_sink() {
        struct AlwaysFails;
        impl Sink for AlwaysFails {
            fn accept(&mut self, _chunk: &[u8]) -> Result<()> {
                Ok(())
            }
            fn collected(&self) -> u32 {
                0
            }
        }

        let mut net = ScriptedNetwork {
            connections: [packets(&[b"HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\n1.2.3\n"])]
                .into_iter()
                .collect(),
        };
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        let mut rx = [0u8; 64];
        let mut tx = [0u8; 64];
        let resolved = ResolvedLocation { host: Default::default(), location: Default::default() };
        let mut sink = AlwaysFails;

        let result = get_file_ex(&mut net, &mut rng, &resolved, 80, false, &mut rx, &mut tx, &mut sink, true);
        assert_eq!(result.unwrap_err(), Error::BadResponse);
    }
}
