mod range_reader;

pub use range_reader::{
    read_u16_le, read_u32_le, write_u16_le, write_u32_le, RangeReader, SeekReader,
};
