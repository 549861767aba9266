//! Codecs for encoded tile layer data and compressed map files.
//!
//! Tile layer data in Tiled json can be stored as a string instead of an array
//! of ids. The string is processed in two stages, first the `encoding`
//! (practically always base64), then the `compression` (zlib, gzip or zstd).
//! Both stages look up a [Decompressor] by name in a [DecompressorRegistry].

use std::io::Read;

use crate::{Error, Result};

/// A named codec turning bytes into bytes.
pub trait Decompressor {
    /// Name used to match the `encoding` or `compression` field of a layer.
    fn name(&self) -> &str;

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a whole file, e.g. a compressed map.
    fn decompress_file(&self, path: &std::path::Path) -> Result<Vec<u8>> {
        self.decompress(&std::fs::read(path)?)
    }
}

/// Decodes base64 text into raw bytes.
#[derive(Debug, Default)]
pub struct Base64Decompressor;

impl Decompressor for Base64Decompressor {
    fn name(&self) -> &str { "base64" }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(base64::decode(input.trim_ascii())?)
    }
}

// helper macro for decoding compressed data using libflate
macro_rules! decode_with {
    ($input:ident $compression:ident) => {{
        let mut decoded = Vec::new();
        let mut decoder = libflate::$compression::Decoder::new(&$input[..])?;
        decoder.read_to_end(&mut decoded)?;
        decoded
    }};
}

/// Inflates zlib streams.
#[derive(Debug, Default)]
pub struct ZlibDecompressor;

impl Decompressor for ZlibDecompressor {
    fn name(&self) -> &str { "zlib" }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(decode_with!(input zlib))
    }
}

/// Inflates gzip streams.
#[derive(Debug, Default)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn name(&self) -> &str { "gzip" }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(decode_with!(input gzip))
    }
}

/// Collection of [Decompressors](Decompressor), addressed by their name.
#[derive(Default)]
pub struct DecompressorRegistry {
    decompressors: Vec<Box<dyn Decompressor>>,
}

impl DecompressorRegistry {
    /// An empty registry. Encoded tile data is left undecoded with it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing base64, zlib and gzip.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add(Base64Decompressor);
        registry.add(ZlibDecompressor);
        registry.add(GzipDecompressor);
        registry
    }

    /// Add a decompressor, replacing a previous one with the same name.
    pub fn add<D: Decompressor + 'static>(&mut self, decompressor: D) {
        self.remove(decompressor.name());
        self.decompressors.push(Box::new(decompressor));
    }

    pub fn remove(&mut self, name: &str) {
        self.decompressors.retain(|d| d.name() != name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Decompressor> {
        self.decompressors.iter().find(|d| d.name() == name).map(|d| d.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.decompressors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decompressors.len()
    }

    /// Turn the string form of tile layer data into tile ids.
    ///
    /// A codec name without a registered decompressor gives
    /// [Error::UnsupportedFeature]. Data without an encoding yields no ids.
    pub fn decode_tile_data(&self, data: &str, encoding: &str, compression: &str) -> Result<Vec<u32>> {
        if encoding.is_empty() {
            return Ok(Vec::new());
        }

        let mut bytes = data.as_bytes().to_vec();
        for (stage, name) in [("encoding", encoding), ("compression", compression)] {
            if name.is_empty() {
                continue;
            }
            let decompressor = self.get(name)
                .ok_or_else(|| Error::UnsupportedFeature(format!("{} '{}'", stage, name)))?;
            bytes = decompressor.decompress(&bytes)?;
        }
        bytes_to_ids(&bytes)
    }
}

impl std::fmt::Debug for DecompressorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.decompressors.iter().map(|d| d.name())).finish()
    }
}

/// Reinterpret bytes as little endian u32 values.
pub fn bytes_to_ids(bytes: &[u8]) -> Result<Vec<u32>> {
    const BYTE_SIZE: usize = std::mem::size_of::<u32>();
    if bytes.len() % BYTE_SIZE != 0 {
        return Err(Error::ParseError(
            format!("Tile data of {} bytes is not a multiple of {}", bytes.len(), BYTE_SIZE).into()
        ));
    }

    Ok(bytes.chunks_exact(BYTE_SIZE)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
