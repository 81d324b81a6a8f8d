use thiserror::Error;

/// I/O errors that can occur when reading from a byte source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// The resource could not be opened
    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },

    /// Seek or read failure on an open resource
    #[error("Read error: {0}")]
    Read(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Read(err.to_string())
    }
}

/// Errors that can occur when parsing TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Big-endian ("MM") files are recognised but not handled
    #[error("Unsupported byte order: only little-endian (II) TIFF files are supported")]
    UnsupportedByteOrder,

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42, got {0}")]
    InvalidVersion(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// First IFD offset is not 2-byte aligned
    #[error("First image directory must be 2-byte-aligned, but its offset is {0}")]
    MisalignedIfdOffset(u32),

    /// The IFD chain points back at a directory that was already read
    #[error("IFD chain loops back to offset {0}")]
    IfdLoop(u32),

    /// The IFD chain is longer than any sane file would need
    #[error("IFD chain exceeds {0} directories")]
    IfdChainTooLong(usize),

    /// ASCII value whose last byte is not NUL
    #[error("Bad ASCII string in tag {tag} at offset {offset}: not NUL-terminated")]
    UnterminatedAscii { tag: u16, offset: u32 },
}

/// Errors raised while writing corrected values back into a file
#[derive(Debug, Clone, Error)]
pub enum PatchError {
    /// The file could not be opened for read+write
    #[error("Failed to open file for writing: {0}")]
    Open(String),

    /// Seek or write failure while a patch was being applied
    #[error("Failed to write {len} bytes at offset {offset}: {message}")]
    Write {
        offset: u64,
        len: usize,
        message: String,
    },

    /// The patch would extend past the end of the file
    #[error("Patch of {len} bytes at offset {offset} exceeds file size {size}")]
    OutOfRange { offset: u64, len: usize, size: u64 },

    /// The replacement would not occupy exactly the bytes it replaces
    #[error("Replacement for {field} is {new} units but the original is {old}")]
    LengthMismatch {
        field: String,
        old: usize,
        new: usize,
    },

    /// Flushing the file to disk failed
    #[error("Failed to sync file: {0}")]
    Sync(String),

    /// Re-reading a patched range returned different bytes
    #[error("Verification failed at offset {offset}: bytes on disk differ from the written patch")]
    VerifyMismatch { offset: u64 },
}

/// Errors that stop a whole correction run
#[derive(Debug, Clone, Error)]
pub enum FixupError {
    /// The candidate directory could not be listed
    #[error("Failed to open directory {path}: {message}")]
    Scan { path: String, message: String },

    /// A decode failure that the run treats as fatal
    #[error("Fatal error in {path}: {source}")]
    Fatal {
        path: String,
        #[source]
        source: TiffError,
    },
}
