use bytes::Bytes;

use crate::error::{DissectError, Result};

pub const UDP_HEADER_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Udp {
    pub source_port: u16,
    pub destination_port: u16,
    pub length: u16,
    pub checksum: u16,
    payload: Bytes,
}

impl Udp {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < UDP_HEADER_LEN {
            return Err(DissectError::Truncated {
                needed: UDP_HEADER_LEN,
                available: data.len(),
            });
        }

        let source_port = u16::from_be_bytes([data[0], data[1]]);
        let destination_port = u16::from_be_bytes([data[2], data[3]]);
        let length = u16::from_be_bytes([data[4], data[5]]);
        let checksum = u16::from_be_bytes([data[6], data[7]]);

        if (length as usize) < UDP_HEADER_LEN {
            return Err(DissectError::Malformed(format!(
                "UDP長フィールドがヘッダー長より小さい値です: {}",
                length
            )));
        }

        // ペイロードは所有コピー。長さフィールドが実バッファを超える場合は
        // 取得できた分だけ写す。
        let declared = length as usize - UDP_HEADER_LEN;
        let payload_end = (UDP_HEADER_LEN + declared).min(data.len());
        let payload = Bytes::copy_from_slice(&data[UDP_HEADER_LEN..payload_end]);

        Ok(Self {
            source_port,
            destination_port,
            length,
            checksum,
            payload,
        })
    }

    /// 長さフィールドから導出したペイロード長 (length - 8)。
    pub fn payload_length(&self) -> usize {
        self.length as usize - UDP_HEADER_LEN
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
