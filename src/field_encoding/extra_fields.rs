// © 2019 3D Robotics. License: Apache-2.0
//! Extra field encoders for the Central File Header (§4.1).
//!
//! Local File Headers in this crate never carry extra fields: the sizes a
//! Zip64 extra field would carry aren't known until the payload has been
//! read, so there is nothing useful to put there before the trailing Data
//! Descriptor.

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;
const ZIP64_EXTENDED_INFO_ID: u16 = 0x0001;
const UNIX_UID_GID_ID: u16 = 0x7875;

/// Extended Timestamp extra field carrying only the modification time, as
/// spec.md requires ("unix seconds, modification bit set").
pub fn write_extended_timestamp(buf: &mut BytesMut, modified: DateTime<Utc>) {
    buf.put_u16_le(EXTENDED_TIMESTAMP_ID);
    buf.put_u16_le(5); // flags byte + 4-byte mtime
    buf.put_u8(0x01); // modification time present
    buf.put_u32_le(modified.timestamp() as u32);
}

pub const EXTENDED_TIMESTAMP_SIZE: u16 = 4 + 5;

/// Zip64 Extended Information extra field. Always emitted in the Central
/// File Header, carrying the true sizes and offset that the legacy fields
/// hold as `0xFFFFFFFF` placeholders.
pub fn write_zip64_extended_info(
    buf: &mut BytesMut,
    uncompressed_size: u64,
    compressed_size: u64,
    local_header_offset: u64,
) {
    buf.put_u16_le(ZIP64_EXTENDED_INFO_ID);
    buf.put_u16_le(24);
    buf.put_u64_le(uncompressed_size);
    buf.put_u64_le(compressed_size);
    buf.put_u64_le(local_header_offset);
}

pub const ZIP64_EXTENDED_INFO_SIZE: u16 = 4 + 24;

/// Info-ZIP New Unix extra field carrying uid/gid. Only emitted when both
/// are present on the entry's attributes.
pub fn write_unix_uid_gid(buf: &mut BytesMut, uid: u32, gid: u32) {
    buf.put_u16_le(UNIX_UID_GID_ID);
    buf.put_u16_le(11); // version(1) + uidsize(1) + uid(4) + gidsize(1) + gid(4)
    buf.put_u8(1); // version
    buf.put_u8(4); // uid size
    buf.put_u32_le(uid);
    buf.put_u8(4); // gid size
    buf.put_u32_le(gid);
}

pub const UNIX_UID_GID_SIZE: u16 = 4 + 11;

#[test]
fn test_extended_timestamp() {
    let mut buf = BytesMut::new();
    let t = "2006-11-10T15:40:56Z".parse::<DateTime<Utc>>().unwrap();
    write_extended_timestamp(&mut buf, t);
    assert_eq!(buf.len(), EXTENDED_TIMESTAMP_SIZE as usize);
    assert_eq!(&buf[0..2], &0x5455u16.to_le_bytes());
}

#[test]
fn test_zip64_extended_info_size() {
    let mut buf = BytesMut::new();
    write_zip64_extended_info(&mut buf, 1, 2, 3);
    assert_eq!(buf.len(), ZIP64_EXTENDED_INFO_SIZE as usize);
}

#[test]
fn test_unix_uid_gid_size() {
    let mut buf = BytesMut::new();
    write_unix_uid_gid(&mut buf, 1000, 1000);
    assert_eq!(buf.len(), UNIX_UID_GID_SIZE as usize);
}
