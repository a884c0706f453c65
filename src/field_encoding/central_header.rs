// © 2019 3D Robotics. License: Apache-2.0
use bytes::{BufMut, Bytes, BytesMut};

use super::dos_time::{dos_date, dos_time};
use super::extra_fields::{
    write_extended_timestamp, write_unix_uid_gid, write_zip64_extended_info,
    EXTENDED_TIMESTAMP_SIZE, UNIX_UID_GID_SIZE, ZIP64_EXTENDED_INFO_SIZE,
};
use crate::manifest::Entry;

const CENTRAL_FILE_HEADER_SIGNATURE: u32 = 0x02014b50;
const ZIP64_VERSION: u16 = 45;
const GP_FLAGS: u16 = (1 << 3) | (1 << 11);
const VERSION_MADE_BY_HOST_UNIX: u8 = 3;
const S_IFREG: u32 = 0o100000;

fn external_attributes(entry: &Entry) -> u32 {
    let a = &entry.attributes;
    let mut mode = a.mode as u32;
    if a.setuid {
        mode |= 0o4000;
    }
    if a.setgid {
        mode |= 0o2000;
    }
    if a.sticky {
        mode |= 0o1000;
    }
    (S_IFREG | mode) << 16
}

/// Central File Header for one successfully-encoded entry. Legacy
/// size/offset fields are always `0xFFFFFFFF` placeholders; the real
/// values live in the Zip64 Extended Information extra field (§4.1).
pub fn central_file_header(
    entry: &Entry,
    offset: u64,
    checksum: u32,
    compressed_size: u64,
    uncompressed_size: u64,
) -> Bytes {
    let name = entry.path.as_bytes();
    let has_uid_gid = entry.attributes.uid.is_some() && entry.attributes.gid.is_some();

    let extra_field_length = EXTENDED_TIMESTAMP_SIZE
        + ZIP64_EXTENDED_INFO_SIZE
        + if has_uid_gid { UNIX_UID_GID_SIZE } else { 0 };

    let mut buf = BytesMut::with_capacity(46 + name.len() + extra_field_length as usize);

    buf.put_u32_le(CENTRAL_FILE_HEADER_SIGNATURE);
    buf.put_u8(ZIP64_VERSION as u8);
    buf.put_u8(VERSION_MADE_BY_HOST_UNIX);
    buf.put_u16_le(ZIP64_VERSION);
    buf.put_u16_le(GP_FLAGS);
    buf.put_u16_le(entry.method.zip_code());
    buf.put_u16_le(dos_time(entry.timestamp));
    buf.put_u16_le(dos_date(entry.timestamp));
    buf.put_u32_le(checksum);
    buf.put_u32_le(0xFFFFFFFF); // compressed size: see Zip64 extra
    buf.put_u32_le(0xFFFFFFFF); // uncompressed size: see Zip64 extra
    buf.put_u16_le(name.len() as u16);
    buf.put_u16_le(extra_field_length);
    buf.put_u16_le(0); // file comment length
    buf.put_u16_le(0); // disk number start
    buf.put_u16_le(0); // internal file attributes
    buf.put_u32_le(external_attributes(entry));
    buf.put_u32_le(0xFFFFFFFF); // local header offset: see Zip64 extra
    buf.put_slice(name);

    write_extended_timestamp(&mut buf, entry.timestamp);
    write_zip64_extended_info(&mut buf, uncompressed_size, compressed_size, offset);
    if let (Some(uid), Some(gid)) = (entry.attributes.uid, entry.attributes.gid) {
        write_unix_uid_gid(&mut buf, uid, gid);
    }

    buf.freeze()
}
