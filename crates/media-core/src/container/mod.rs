//! Container output for received media

pub mod ogg;

pub use ogg::OggOpusWriter;
