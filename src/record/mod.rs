use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::network::packet::{EtherType, NextProtocol, Packet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationProtocol {
    Dns,
    Http,
    Irc,
}

/// 解析結果から射影した所有型のサマリレコード。
/// Packet と違いフレームバッファへの借用を持たないため、
/// フレームの寿命を越えて保持・シリアライズできる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketRecord {
    pub source_mac: Option<String>,
    pub destination_mac: Option<String>,
    pub ether_type: Option<EtherType>,
    pub source_ip: Option<IpAddr>,
    pub destination_ip: Option<IpAddr>,
    pub protocol: Option<NextProtocol>,
    pub source_port: Option<u16>,
    pub destination_port: Option<u16>,
    pub length: usize,
    pub payload_length: usize,
    pub application: Option<ApplicationProtocol>,
}

impl PacketRecord {
    pub fn from_packet(packet: &Packet) -> Self {
        let (source_ip, destination_ip, protocol) = if let Some(header) = packet.ipv4() {
            (
                Some(IpAddr::V4(header.source)),
                Some(IpAddr::V4(header.destination)),
                Some(header.next_protocol()),
            )
        } else if let Some(header) = packet.ipv6() {
            (
                Some(IpAddr::V6(header.source)),
                Some(IpAddr::V6(header.destination)),
                Some(header.next_protocol()),
            )
        } else {
            (None, None, None)
        };

        let (source_port, destination_port) = if let Some(header) = packet.tcp() {
            (Some(header.source_port), Some(header.destination_port))
        } else if let Some(header) = packet.udp() {
            (Some(header.source_port), Some(header.destination_port))
        } else {
            (None, None)
        };

        let application = if packet.dns().is_some() {
            Some(ApplicationProtocol::Dns)
        } else if packet.http().is_some() {
            Some(ApplicationProtocol::Http)
        } else if packet.irc().is_some() {
            Some(ApplicationProtocol::Irc)
        } else {
            None
        };

        Self {
            source_mac: packet.ethernet().map(|header| header.source()),
            destination_mac: packet.ethernet().map(|header| header.destination()),
            ether_type: packet.ethernet().map(|header| header.ether_type),
            source_ip,
            destination_ip,
            protocol,
            source_port,
            destination_port,
            length: packet.length(),
            payload_length: packet.payload_length(),
            application,
        }
    }
}
