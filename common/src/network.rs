//! # Network Models
//!
//! * [`range::AddressRange`]: a static block of addresses, the unit of input.
//! * [`candidate::Candidate`]: one address and port slated for a single probe.
//! * [`result::ProbeResult`]: the immutable outcome of that probe.
//! * [`catalog`]: the published ranges sampled when none are supplied.
//! * [`premium`]: curated single addresses probed by small default runs.

pub mod candidate;
pub mod catalog;
pub mod premium;
pub mod range;
pub mod result;
