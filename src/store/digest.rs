use std::fmt;
use std::str::FromStr;

use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Hash used to derive a secret's id from its plain text.
///
/// Ids are content-addressed: the same plain text always maps to the same
/// id. `Md5` is the default and matches ids handed out by existing
/// deployments; `Sha256` is the hardened choice, since an id is also the
/// capability that grants the one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Digest {
    #[default]
    Md5,
    Sha256,
}

impl Digest {
    /// Lowercase hex digest of `plain_text`.
    pub fn id_for(&self, plain_text: &str) -> String {
        match self {
            Digest::Md5 => format!("{:x}", md5::compute(plain_text.as_bytes())),
            Digest::Sha256 => hex::encode(Sha256::digest(plain_text.as_bytes())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Digest::Md5 => "md5",
            Digest::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown digest '{0}': expected md5 or sha256")]
pub struct UnknownDigest(pub String);

impl FromStr for Digest {
    type Err = UnknownDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Digest::Md5),
            "sha256" | "sha-256" => Ok(Digest::Sha256),
            other => Err(UnknownDigest(other.to_string())),
        }
    }
}
