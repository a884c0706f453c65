// © 2019 3D Robotics. License: Apache-2.0
use bytes::{BufMut, Bytes, BytesMut};

const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;

/// Trailing record carrying CRC-32 and the (always ZIP64-wide) sizes for an
/// entry whose Local File Header left them as placeholders (§4.1).
pub fn data_descriptor(crc32: u32, compressed_size: u64, uncompressed_size: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(24);
    buf.put_u32_le(DATA_DESCRIPTOR_SIGNATURE);
    buf.put_u32_le(crc32);
    buf.put_u64_le(compressed_size);
    buf.put_u64_le(uncompressed_size);
    buf.freeze()
}

#[test]
fn test_data_descriptor_layout() {
    let dd = data_descriptor(0xdeadbeef, 10, 20);
    assert_eq!(dd.len(), 24);
    assert_eq!(&dd[0..4], &DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
    assert_eq!(&dd[4..8], &0xdeadbeefu32.to_le_bytes());
    assert_eq!(&dd[8..16], &10u64.to_le_bytes());
    assert_eq!(&dd[16..24], &20u64.to_le_bytes());
}
