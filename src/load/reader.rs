//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{io::Read, vec::Vec};

use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    ballot::Ballot,
    wire::{self, Source, Wire},
};

use super::{Digest20, HeaderError, check_header};

extern crate std;

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Calculated and found digests do not match.
    #[error("Calculated ({calculated:02x?}) and found ({found:02x?}) digests do not match.")]
    Integrity {
        found: Digest20,
        calculated: Digest20,
    },
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] HeaderError),
    /// Malformed ballot contents.
    #[error("Malformed ballot: {0}")]
    Format(#[from] wire::Error),
}

/// Decode a ballot from a reader positioned at the start of a file.
///
/// Every byte of the ballot body is hashed as it is consumed. The header and
/// the digest itself are read around the hash. Bytes after the digest are left
/// unread.
///
/// This method is also re-exported as `kiosk_ballot::load::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read) -> Result<Ballot, Error> {
    check_header(take(r)?)?;

    let mut source = Hashing {
        r: &mut *r,
        sha: Sha1::new(),
    };
    let ballot = Ballot::decode(&mut source)?;

    let calculated: Digest20 = source.sha.finalize().into();
    let found: Digest20 = take(r)?;

    if found != calculated {
        warn!(?found, ?calculated, "ballot digest mismatch");
        Err(Error::Integrity { found, calculated })?;
    }

    debug!(
        groups = ballot.model.groups.len(),
        pages = ballot.model.pages.len(),
        clips = ballot.audio.clips.len(),
        sprites = ballot.video.sprites.len(),
        "decoded ballot from reader"
    );

    Ok(ballot)
}

/// A reader feeding every byte it yields into a running digest.
struct Hashing<'r, R> {
    r: &'r mut R,
    sha: Sha1,
}

impl<R: Read> Source for Hashing<'_, R> {
    type Error = Error;

    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let buf = take(self.r)?;
        self.sha.update(buf);
        Ok(buf)
    }

    fn take_vec(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        // Grow with the data actually read, not the declared length.
        let mut buf = Vec::new();
        self.r.by_ref().take(len as u64).read_to_end(&mut buf)?;

        if buf.len() != len {
            Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
        }

        self.sha.update(&buf);
        Ok(buf)
    }
}

/// Take an exact number of bytes from a reader.
fn take<const N: usize>(r: &mut impl Read) -> Result<[u8; N], Error> {
    let mut buf = [0; N];
    r.read_exact(&mut buf)?;

    Ok(buf)
}
