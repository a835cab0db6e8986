use serde::{Deserialize, Serialize};

use crate::error::{DissectError, Result};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const VLAN_TAG_LEN: usize = 4;
/// 802.1Q タグの多重ネストの上限。これを超えるフレームは不正入力として扱う。
pub const MAX_VLAN_DEPTH: usize = 16;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_VLAN: u16 = 0x8100;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EtherType {
    IPv4,
    IPv6,
    Arp,
    Unknown,
}

impl EtherType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            ETHERTYPE_IPV4 => EtherType::IPv4,
            ETHERTYPE_IPV6 => EtherType::IPv6,
            ETHERTYPE_ARP => EtherType::Arp,
            _ => EtherType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EtherType::IPv4 => "IPv4",
            EtherType::IPv6 => "IPv6",
            EtherType::Arp => "ARP",
            EtherType::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ethernet<'a> {
    pub destination: [u8; 6],
    pub source: [u8; 6],
    pub ether_type: EtherType,
    payload: &'a [u8],
}

impl<'a> Ethernet<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < ETHERNET_HEADER_LEN {
            return Err(DissectError::Truncated {
                needed: ETHERNET_HEADER_LEN,
                available: data.len(),
            });
        }

        let mut destination = [0u8; 6];
        let mut source = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        source.copy_from_slice(&data[6..12]);

        // 802.1Q タグが積まれている場合は内側のタイプ値まで剥がす
        let mut raw_type = u16::from_be_bytes([data[12], data[13]]);
        let mut offset = ETHERNET_HEADER_LEN;
        let mut depth = 0;

        while raw_type == ETHERTYPE_VLAN && depth < MAX_VLAN_DEPTH {
            if data.len() < offset + VLAN_TAG_LEN {
                return Err(DissectError::Truncated {
                    needed: offset + VLAN_TAG_LEN,
                    available: data.len(),
                });
            }
            raw_type = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
            offset += VLAN_TAG_LEN;
            depth += 1;
        }

        Ok(Self {
            destination,
            source,
            ether_type: EtherType::from_u16(raw_type),
            payload: &data[offset..],
        })
    }

    /// 送信元MACアドレスのコロン区切り文字列表現。
    pub fn source(&self) -> String {
        format_mac(&self.source)
    }

    /// 宛先MACアドレスのコロン区切り文字列表現。
    pub fn destination(&self) -> String {
        format_mac(&self.destination)
    }

    pub fn type_name(&self) -> &'static str {
        self.ether_type.as_str()
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

fn format_mac(octets: &[u8; 6]) -> String {
    octets
        .iter()
        .map(|octet| format!("{:02x}", octet))
        .collect::<Vec<_>>()
        .join(":")
}
