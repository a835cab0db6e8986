use std::net::Ipv6Addr;

use crate::error::{DissectError, Result};
use crate::network::packet::{
    NextProtocol, PROTO_IPV6_DESTOPT, PROTO_IPV6_HOPOPT, PROTO_IPV6_ROUTE,
};

pub const IPV6_HEADER_LEN: usize = 40;
/// 拡張ヘッダーチェーンを辿る上限。循環チェーンでも必ず停止する。
pub const MAX_EXTENSION_HOPS: usize = 10;

#[derive(Debug, Clone)]
pub struct Ipv6<'a> {
    pub version: u8,
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: u8,
    pub hop_limit: u8,
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    resolved_protocol: NextProtocol,
    resolved_length: usize,
    payload: &'a [u8],
}

impl<'a> Ipv6<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < IPV6_HEADER_LEN {
            return Err(DissectError::Truncated {
                needed: IPV6_HEADER_LEN,
                available: data.len(),
            });
        }

        let version = (data[0] >> 4) & 0xf;
        let traffic_class = ((data[0] & 0xf) << 4) | (data[1] >> 4);
        let flow_label = u32::from_be_bytes([0, data[1] & 0xf, data[2], data[3]]);
        let payload_length = u16::from_be_bytes([data[4], data[5]]);
        let next_header = data[6];
        let hop_limit = data[7];

        let mut source_bytes = [0u8; 16];
        source_bytes.copy_from_slice(&data[8..24]);
        let source = Ipv6Addr::from(source_bytes);

        let mut destination_bytes = [0u8; 16];
        destination_bytes.copy_from_slice(&data[24..40]);
        let destination = Ipv6Addr::from(destination_bytes);

        // 拡張ヘッダーを辿り、最終的なプロトコルとペイロード開始位置を求める。
        // チェーンは攻撃者が制御できるためホップ数を固定値で打ち切る。
        let mut next = next_header;
        let mut offset = IPV6_HEADER_LEN;
        let mut resolved_length = payload_length as usize;

        for _ in 0..MAX_EXTENSION_HOPS {
            match next {
                PROTO_IPV6_HOPOPT | PROTO_IPV6_ROUTE | PROTO_IPV6_DESTOPT => {
                    if data.len() < offset + 2 {
                        break;
                    }
                    let inner = data[offset];
                    let extension_len = (data[offset + 1] as usize + 1) * 8;

                    next = inner;
                    resolved_length = resolved_length.saturating_sub(extension_len);
                    offset += extension_len;

                    if offset >= data.len() {
                        offset = data.len();
                        break;
                    }
                }
                _ => break,
            }
        }

        let payload_end = (offset + resolved_length).min(data.len());

        Ok(Self {
            version,
            traffic_class,
            flow_label,
            payload_length,
            next_header,
            hop_limit,
            source,
            destination,
            resolved_protocol: NextProtocol::from_u8(next),
            resolved_length,
            payload: &data[offset..payload_end],
        })
    }

    /// RFC 5952 正規形の送信元アドレス。
    pub fn source(&self) -> String {
        self.source.to_string()
    }

    /// RFC 5952 正規形の宛先アドレス。
    pub fn destination(&self) -> String {
        self.destination.to_string()
    }

    /// 拡張ヘッダーチェーンを解決した後のプロトコル。
    pub fn next_protocol(&self) -> NextProtocol {
        self.resolved_protocol
    }

    pub fn next_header_name(&self) -> &'static str {
        self.resolved_protocol.as_str()
    }

    /// 拡張ヘッダー分を差し引いたペイロード長。
    pub fn resolved_payload_length(&self) -> usize {
        self.resolved_length
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}
