//! File format parsers.
//!
//! Only the subset of TIFF needed to locate DNG metadata is implemented.

pub mod tiff;
