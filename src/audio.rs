//! 音频参数：编码、采样率、声道数的描述、探测与校验。
//!
//! Audio parameters accepted by the recognition service.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`descriptor`] | [`AudioEncoding`] and [`AudioDescriptor`] |
//! | [`validator`] | Capability table and [`AudioValidator`] |
//! | [`probe`] | Container sniffing of raw bytes |
//! | [`source`] | Reading any async byte source |

pub mod descriptor;
pub mod probe;
pub mod source;
pub mod validator;

pub use descriptor::{AudioDescriptor, AudioEncoding};
pub use probe::probe;
pub use source::read_source;
pub use validator::{AudioValidator, EncodingRule};
