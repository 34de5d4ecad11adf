//! Splits a `host[/path...]` string into host and location parts.
//!
//! Grounded on the reference's `ota_get_host` / `ota_get_location`: everything
//! up to the first `/` is the host, everything after it is the location.

use heapless::String;

use crate::proto::HOST_LEN;
use crate::proto::RECV_BUF_LEN;

/// Host name, bounded to `HOST_LEN` bytes.
pub type Host = String<HOST_LEN>;
/// Path/location, bounded to `RECV_BUF_LEN` bytes (the same scratch-size bound
/// the reference uses for `last_location`).
pub type Location = String<RECV_BUF_LEN>;

/// Splits `repo` into `(host, location)`. `location` is empty when `repo`
/// contains no `/`.
pub fn split_repo(repo: &str) -> (Host, Location) {
    let mut host = Host::new();
    let mut location = Location::new();

    match repo.find('/') {
        Some(pos) => {
            let _ = host.push_str(&repo[..pos]);
            let _ = location.push_str(&repo[pos + 1..]);
        }
        None => {
            let _ = host.push_str(repo);
        }
    }

    (host, location)
}

/// Joins `location` and `file` with a single `/`, the way the reference's
/// `ota_get_final_location` appends the requested file name onto whatever
/// location `split_repo` produced.
pub fn join_location(location: &str, file: &str) -> Location {
    let mut joined = Location::new();
    if !location.is_empty() {
        let _ = joined.push_str(location);
        let _ = joined.push('/');
    }
    let _ = joined.push_str(file);
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_host_and_location() {
        let (host, location) = split_repo("ota.example/firmware/main.bin");
        assert_eq!(host.as_str(), "ota.example");
        assert_eq!(location.as_str(), "firmware/main.bin");
    }

    #[test]
    fn host_only_has_empty_location() {
        let (host, location) = split_repo("ota.example");
        assert_eq!(host.as_str(), "ota.example");
        assert_eq!(location.as_str(), "");
    }

    #[test]
    fn join_location_with_existing_path() {
        let joined = join_location("firmware", "main.bin");
        assert_eq!(joined.as_str(), "firmware/main.bin");
    }

    #[test]
    fn join_location_with_empty_path() {
        let joined = join_location("", "main.bin");
        assert_eq!(joined.as_str(), "main.bin");
    }
}
