//! Response body compression.

use std::io::{self, Write};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::error::StaticError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    /// zlib-wrapped deflate, which is what browsers expect for `deflate`.
    Deflate,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
        }
    }
}

/// Text-like payloads compress well; images and fonts are already compressed.
pub fn is_compressible(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.contains("javascript")
        || content_type.contains("json")
        || content_type.contains("xml")
}

/// Pick an encoding for `content_type` given the client's `Accept-Encoding`.
///
/// gzip wins over deflate regardless of the order or weights the client
/// sent; a coding listed with `q=0` counts as refused.
pub fn negotiate(accept_encoding: Option<&str>, content_type: &str) -> Option<Encoding> {
    if !is_compressible(content_type) {
        return None;
    }
    let offered = accepted_codings(accept_encoding?);

    if offered.iter().any(|c| c == "gzip") {
        Some(Encoding::Gzip)
    } else if offered.iter().any(|c| c == "deflate") {
        Some(Encoding::Deflate)
    } else {
        None
    }
}

fn accepted_codings(header: &str) -> Vec<String> {
    header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let coding = parts.next()?.trim().to_ascii_lowercase();
            if coding.is_empty() {
                return None;
            }
            let refused = parts.any(|param| {
                let Some((name, value)) = param.split_once('=') else {
                    return false;
                };
                name.trim().eq_ignore_ascii_case("q")
                    && value.trim().parse::<f32>().is_ok_and(|q| q <= 0.0)
            });
            (!refused).then_some(coding)
        })
        .collect()
}

/// Compress `data` in memory.
pub fn compress(data: &[u8], encoding: Encoding) -> io::Result<Vec<u8>> {
    match encoding {
        Encoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Encoding::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

/// Compress on the blocking pool so large bodies do not stall the runtime.
pub async fn compress_body(data: Bytes, encoding: Encoding) -> Result<Bytes, StaticError> {
    let failure = |source| StaticError::CompressionFailure {
        encoding: encoding.as_str(),
        source,
    };

    match tokio::task::spawn_blocking(move || compress(&data, encoding)).await {
        Ok(Ok(compressed)) => Ok(Bytes::from(compressed)),
        Ok(Err(e)) => Err(failure(e)),
        Err(join) => Err(failure(io::Error::other(join))),
    }
}
