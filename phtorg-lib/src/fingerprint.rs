use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
    str::FromStr,
};

use derive_more::{Display, Into};

use crate::Error;

/// Files are hashed this many bytes at a time.
pub const CHUNK_SIZE: usize = 10 * 1024 * 1024;
pub const FINGERPRINT_LEN: usize = 7;

/// First hex characters of the BLAKE3 hash of a file's content, git style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Into)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_file(path: &Path) -> Result<Self, Error> {
        Self::of_reader(File::open(path)?)
    }

    pub fn of_reader(mut reader: impl Read) -> Result<Self, Error> {
        let mut hasher = blake3::Hasher::new();
        let mut chunk = vec![0; CHUNK_SIZE];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&chunk[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Self::from(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<blake3::Hash> for Fingerprint {
    fn from(hash: blake3::Hash) -> Self {
        Self(hash.to_hex().as_str()[..FINGERPRINT_LEN].to_string())
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == FINGERPRINT_LEN
            && s.chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !valid {
            return Err(Error::InvalidFingerprint(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}
