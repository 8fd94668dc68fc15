//! External collaborator services.
//!
//! The engine consumes these through traits: container extraction
//! (ffprobe/ffmpeg), OCR for image-based subtitle streams, and machine
//! translation. Every implementation is deadline-bounded; tests inject
//! mocks.

pub mod container;
pub mod ocr;
pub mod translator;
