//! # Core Framing Components
//!
//! Length-prefix decoding, validation and the tokio codec built on it.
//!
//! ## Components
//! - **Frame**: header decode/encode, length validation, single-frame reads
//! - **Codec**: Tokio codec for framing over byte streams
//!
//! ## Wire Format
//! ```text
//! [DeclaredLength(4, LE, includes itself)] [Payload(DeclaredLength - 4)]
//! ```
//!
//! ## Security
//! - Declared lengths are checked against a maximum before allocation
//! - Lengths below the header size are rejected

pub mod codec;
pub mod frame;
