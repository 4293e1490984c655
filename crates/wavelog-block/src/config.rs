/// Configuration for a per-wavelet block store.
#[derive(Clone, Debug)]
pub struct BlockStoreConfig {
    /// Low-water byte threshold: a block at or above this size never
    /// receives a new fragment; the next write rolls into a fresh block.
    pub low_water_bytes: u64,
    /// Worker threads backing asynchronous reads. `0` runs every fetch
    /// inline on the calling thread behind the same future-returning
    /// interface.
    pub reader_threads: usize,
    /// zstd compression level for fragment payloads.
    pub compression_level: i32,
}

impl Default for BlockStoreConfig {
    fn default() -> Self {
        Self {
            low_water_bytes: 256 * 1024, // 256 KiB
            reader_threads: 0,
            compression_level: 3,
        }
    }
}
