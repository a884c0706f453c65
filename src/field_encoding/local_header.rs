// © 2019 3D Robotics. License: Apache-2.0
use bytes::{BufMut, Bytes, BytesMut};

use super::dos_time::{dos_date, dos_time};
use crate::manifest::{Entry, Method};

const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
const ZIP64_VERSION: u16 = 45;

/// General purpose bit flag: bit 3 (data descriptor follows) and bit 11
/// (UTF-8 names) are always set (§4.1).
const GP_FLAGS: u16 = (1 << 3) | (1 << 11);

/// Streaming Local File Header: sizes and CRC are placeholder zero bytes,
/// to be recovered from the trailing Data Descriptor (§4.1).
pub fn local_file_header(entry: &Entry) -> Bytes {
    let name = entry.path.as_bytes();
    let mut buf = BytesMut::with_capacity(30 + name.len());

    buf.put_u32_le(LOCAL_FILE_HEADER_SIGNATURE);
    buf.put_u16_le(ZIP64_VERSION);
    buf.put_u16_le(GP_FLAGS);
    buf.put_u16_le(entry.method.zip_code());
    buf.put_u16_le(dos_time(entry.timestamp));
    buf.put_u16_le(dos_date(entry.timestamp));
    buf.put_u32_le(0); // crc-32 (deferred to Data Descriptor)
    buf.put_u32_le(0); // compressed size (deferred)
    buf.put_u32_le(0); // uncompressed size (deferred)
    buf.put_u16_le(name.len() as u16);
    buf.put_u16_le(0); // extra field length: none, see module docs
    buf.put_slice(name);

    buf.freeze()
}

#[test]
fn test_local_file_header_layout() {
    let entry = Entry::new(crate::source::SourceDescriptor::Random(0), "foo.txt")
        .with_method(Method::Store);
    let header = local_file_header(&entry);

    assert_eq!(&header[0..4], &LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
    assert_eq!(u16::from_le_bytes([header[4], header[5]]), ZIP64_VERSION);
    assert_eq!(u16::from_le_bytes([header[6], header[7]]), GP_FLAGS);
    assert_eq!(u16::from_le_bytes([header[8], header[9]]), 0); // store
    assert_eq!(&header[14..18], &0u32.to_le_bytes()); // crc placeholder
    assert_eq!(&header[18..22], &0u32.to_le_bytes()); // compressed size placeholder
    assert_eq!(&header[22..26], &0u32.to_le_bytes()); // uncompressed size placeholder
    assert_eq!(u16::from_le_bytes([header[26], header[27]]), 7); // "foo.txt".len()
    assert_eq!(u16::from_le_bytes([header[28], header[29]]), 0); // no extra field
    assert_eq!(&header[30..], b"foo.txt");
}
