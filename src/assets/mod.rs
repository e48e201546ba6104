//! Media decoding and project loading.
//!
//! This is the stand-in for the image and speech generation collaborators: everything is decoded
//! up front, so rendering and scheduling never touch the filesystem.

/// Image and audio decoding.
pub mod decode;
/// Project JSON files.
pub mod project;
