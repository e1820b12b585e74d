//! Loading and saving ballot definition files.
//!
//! A file is an eight-byte header, the encoded [`Ballot`], and a SHA-1 digest
//! of exactly the encoded ballot. A ballot is only returned once its digest
//! matches; no partially decoded ballot is ever exposed.
//!
//! Two decoders are provided, following the same layout. [`decode_slice`]
//! checks the digest over a complete buffer before decoding it, while
//! `decode_reader` hashes bytes as they are consumed from a reader and
//! compares the digest once the ballot has been decoded.
//!
//! Loading does not verify a ballot. Pass it to [`crate::verify`] before
//! starting a session.

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

use alloc::vec::Vec;

use sha1::{Digest, Sha1};
use thiserror::Error;
use zerocopy::FromBytes;

use crate::{ballot::Ballot, wire::Wire};

/// Leading bytes of every ballot definition file.
pub const MAGIC: [u8; 8] = *b"Pvote\x00\x01\x00";

/// Length of the trailing digest.
pub const DIGEST_LEN: usize = 20;

/// A SHA-1 digest of an encoded ballot.
pub type Digest20 = [u8; DIGEST_LEN];

/// An error reading the file header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Incorrect file type marker.
    #[error("Incorrect ballot file marker.")]
    NotBallot,
    /// Known marker, unknown format version.
    #[error("Unsupported format version ({0}.{1}).")]
    UnsupportedVersion(u8, u8),
}

/// Check the eight-byte header.
pub(crate) fn check_header(r: [u8; 8]) -> Result<(), HeaderError> {
    #[repr(C)]
    #[derive(FromBytes)]
    struct FileHeader {
        name: [u8; 5],
        reserved: u8,
        major: u8,
        minor: u8,
    }

    let FileHeader {
        name,
        reserved,
        major,
        minor,
    } = zerocopy::transmute!(r);

    if &name != b"Pvote" || reserved != MAGIC[5] {
        Err(HeaderError::NotBallot)?;
    }
    if (major, minor) != (MAGIC[6], MAGIC[7]) {
        Err(HeaderError::UnsupportedVersion(major, minor))?;
    }

    Ok(())
}

impl Ballot {
    /// Encode this ballot, without header or digest.
    pub fn encode_body(&self) -> Vec<u8> {
        let mut w = Vec::new();
        self.encode(&mut w);
        w
    }

    /// Compute the digest that a file holding this ballot carries.
    pub fn digest(&self) -> Digest20 {
        Sha1::digest(self.encode_body()).into()
    }

    /// Encode this ballot as a complete file: header, body and digest.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.encode_body();
        let digest: Digest20 = Sha1::digest(&body).into();

        let mut w = Vec::with_capacity(MAGIC.len() + body.len() + DIGEST_LEN);
        w.extend_from_slice(&MAGIC);
        w.extend_from_slice(&body);
        w.extend_from_slice(&digest);
        w
    }
}

#[cfg(feature = "std")]
mod file {
    extern crate std;

    use std::{fs::File, io, io::Write, path::Path};

    use super::reader;
    use crate::ballot::Ballot;

    impl Ballot {
        /// Write this ballot as a complete file to a writer.
        ///
        /// _Requires Cargo feature `std`._
        pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
            w.write_all(&self.to_bytes())
        }

        /// Write this ballot to a file, replacing any existing contents.
        ///
        /// _Requires Cargo feature `std`._
        pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
            let mut file = File::create(path)?;
            self.write_to(&mut file)?;
            file.sync_all()
        }
    }

    /// Load a ballot from a file.
    ///
    /// _Requires Cargo feature `std`._
    pub fn open(path: impl AsRef<Path>) -> Result<Ballot, reader::Error> {
        let mut file = io::BufReader::new(File::open(path)?);
        reader::decode(&mut file)
    }
}

#[cfg(feature = "std")]
pub use file::open;
