// © 2019 3D Robotics. License: Apache-2.0
use bytes::{BufMut, Bytes, BytesMut};

const ZIP64_EOCD_SIGNATURE: u32 = 0x06064b50;
const ZIP64_EOCD_LOCATOR_SIGNATURE: u32 = 0x07064b50;
const EOCD_SIGNATURE: u32 = 0x06054b50;
const ZIP64_VERSION: u16 = 45;
const VERSION_MADE_BY_HOST_UNIX: u8 = 3;

/// The three trailing records written once, after every Central File Header
/// (§4.1 "End of archive"). An archive is always ZIP64: the legacy EOCD's
/// size/count/offset fields are always the `0xFFFF`/`0xFFFFFFFF` placeholders
/// that tell a reader to prefer the Zip64 records.
pub struct EndOfArchive {
    pub entry_count: u64,
    pub central_directory_size: u64,
    pub central_directory_offset: u64,
}

impl EndOfArchive {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(56 + 20 + 22);
        self.write_zip64_eocd(&mut buf);
        self.write_zip64_locator(&mut buf);
        self.write_legacy_eocd(&mut buf);
        buf.freeze()
    }

    fn write_zip64_eocd(&self, buf: &mut BytesMut) {
        buf.put_u32_le(ZIP64_EOCD_SIGNATURE);
        buf.put_u64_le(44); // size of this record, excluding signature+this field
        buf.put_u8(ZIP64_VERSION as u8);
        buf.put_u8(VERSION_MADE_BY_HOST_UNIX);
        buf.put_u16_le(ZIP64_VERSION);
        buf.put_u32_le(0); // number of this disk
        buf.put_u32_le(0); // disk with start of central directory
        buf.put_u64_le(self.entry_count); // entries on this disk
        buf.put_u64_le(self.entry_count); // entries total
        buf.put_u64_le(self.central_directory_size);
        buf.put_u64_le(self.central_directory_offset);
    }

    fn write_zip64_locator(&self, buf: &mut BytesMut) {
        let zip64_eocd_offset = self.central_directory_offset + self.central_directory_size;
        buf.put_u32_le(ZIP64_EOCD_LOCATOR_SIGNATURE);
        buf.put_u32_le(0); // disk with start of zip64 eocd
        buf.put_u64_le(zip64_eocd_offset);
        buf.put_u32_le(1); // total number of disks
    }

    fn write_legacy_eocd(&self, buf: &mut BytesMut) {
        buf.put_u32_le(EOCD_SIGNATURE);
        buf.put_u16_le(0); // number of this disk
        buf.put_u16_le(0); // disk with start of central directory
        buf.put_u16_le(0xFFFF); // entries on this disk: see zip64 eocd
        buf.put_u16_le(0xFFFF); // entries total: see zip64 eocd
        buf.put_u32_le(0xFFFFFFFF); // central directory size: see zip64 eocd
        buf.put_u32_le(0xFFFFFFFF); // central directory offset: see zip64 eocd
        buf.put_u16_le(0); // archive comment length
    }
}
