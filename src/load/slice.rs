//! Slice-based decoder implementation.

use alloc::vec::Vec;

use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    ballot::Ballot,
    wire::{self, Source, Wire},
};

use super::{DIGEST_LEN, Digest20, HeaderError, check_header};

/// Errors occurring while decoding from a slice.
#[derive(Debug, Error)]
pub enum Error {
    /// Unexpectedly reached the end of the slice.
    #[error("Unexpectedly reached the end of the slice.")]
    EndOfSlice,
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
    /// The ballot ended before the digest.
    #[error("Found {0} bytes between the ballot and its digest.")]
    TrailingBytes(usize),
}

/// Decode a ballot from a slice holding a complete file.
///
/// The digest is taken from the final bytes of the slice and checked before
/// decoding begins, so any altered byte is reported as an integrity failure.
///
/// This method is also re-exported as `kiosk_ballot::load::decode_slice`.
pub fn decode(r: &[u8]) -> Result<Ballot, Error> {
    let i = &mut 0; // Offset of the next unread byte.

    check_header(take(r, i)?)?;

    let end = r.len().checked_sub(DIGEST_LEN).ok_or(Error::EndOfSlice)?;
    let body = r.get(*i..end).ok_or(Error::EndOfSlice)?;

    // Apply the integrity check before continuing.
    let found: Digest20 = take(r, &mut { end })?;
    let calculated: Digest20 = Sha1::digest(body).into();

    if found != calculated {
        warn!(?found, ?calculated, "ballot digest mismatch");
        Err(Error::Integrity { found, calculated })?;
    }

    let mut cursor = Cursor { r: body, i: 0 };
    let ballot = Ballot::decode(&mut cursor)?;

    if cursor.i != body.len() {
        Err(Error::TrailingBytes(body.len() - cursor.i))?;
    }

    debug!(
        groups = ballot.model.groups.len(),
        pages = ballot.model.pages.len(),
        clips = ballot.audio.clips.len(),
        sprites = ballot.video.sprites.len(),
        "decoded ballot from slice"
    );

    Ok(ballot)
}

struct Cursor<'a> {
    r: &'a [u8],
    i: usize,
}

impl Source for Cursor<'_> {
    type Error = Error;

    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        take(self.r, &mut self.i)
    }

    fn take_vec(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let s = self.i;
        let e = s.checked_add(len).ok_or(Error::EndOfSlice)?;
        let bytes = self.r.get(s..e).ok_or(Error::EndOfSlice)?;
        self.i = e;

        Ok(bytes.to_vec())
    }
}

/// Take an exact number of bytes from an offset in a slice, advancing the offset.
fn take<const N: usize>(r: &[u8], i: &mut usize) -> Result<[u8; N], Error> {
    let s = *i;
    let e = s.checked_add(N).ok_or(Error::EndOfSlice)?;
    let bytes = r.get(s..e).ok_or(Error::EndOfSlice)?;
    *i = e;

    bytes.try_into().map_err(|_| Error::EndOfSlice)
}
