#![no_std]

//! Ballot definitions and session logic for an audio and touch voting kiosk.
//!
//! A ballot definition file describes every page, state, input binding, audio
//! clip and image a kiosk needs to run an election. This crate loads such a
//! file, proves it internally consistent, and drives a voting session over it
//! without ever interpreting anything but integer indices.
//!
//! A session moves through three barriers, each represented by a type:
//!
//! 1. [`load`] decodes a file into a [`Ballot`], rejecting it unless its
//!    digest matches.
//! 2. [`Verified::new`] checks every cross-reference, size and clip offset,
//!    returning the first violation.
//! 3. [`Navigator::new`] accepts only a [`Verified`] ballot, and turns key
//!    presses, touches and timeouts into audio and display requests.
//!
//! Hosts carry out those requests by implementing the sinks in [`navigator`].
//! The [`timer`] module helps schedule timeouts.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable the reader-based loader and file helpers (default).

extern crate alloc;

pub mod ballot;
pub mod load;
pub mod navigator;
pub mod timer;
pub mod verify;
pub mod wire;

pub use ballot::Ballot;
pub use navigator::{Effects, Navigator};
pub use verify::{Verified, verify};
