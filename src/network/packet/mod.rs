pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod udp;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::application::dns::Dns;
use crate::application::http::Http;
use crate::application::irc::Irc;

pub use ethernet::{EtherType, Ethernet};
pub use ipv4::Ipv4;
pub use ipv6::Ipv6;
pub use tcp::Tcp;
pub use udp::Udp;

pub const PROTO_IPV6_HOPOPT: u8 = 0x00;
pub const PROTO_ICMP: u8 = 0x01;
pub const PROTO_IGMP: u8 = 0x02;
pub const PROTO_TCP: u8 = 0x06;
pub const PROTO_UDP: u8 = 0x11;
pub const PROTO_IPV6: u8 = 0x29;
pub const PROTO_IPV6_ROUTE: u8 = 0x2b;
pub const PROTO_IPV6_FRAG: u8 = 0x2c;
pub const PROTO_IPV6_AUTH: u8 = 0x33;
pub const PROTO_ICMPV6: u8 = 0x3a;
pub const PROTO_IPV6_DESTOPT: u8 = 0x3c;
pub const PROTO_IPV6_MOB: u8 = 0x87;
pub const PROTO_IPV6_HOSTID: u8 = 0x8b;

pub const DNS_PORT: u16 = 53;
pub const HTTP_PORT: u16 = 80;
pub const IRC_PORT: u16 = 6667;

/// IPヘッダーの次プロトコル値の解決結果。IPv4とIPv6で共通。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextProtocol {
    Icmp,
    Igmp,
    Tcp,
    Udp,
    Icmpv6,
    IPv6,
    HopByHop,
    Routing,
    Fragment,
    Authentication,
    Destination,
    Mobility,
    HostId,
    Unknown,
}

impl NextProtocol {
    pub fn from_u8(value: u8) -> Self {
        match value {
            PROTO_IPV6_HOPOPT => NextProtocol::HopByHop,
            PROTO_ICMP => NextProtocol::Icmp,
            PROTO_IGMP => NextProtocol::Igmp,
            PROTO_TCP => NextProtocol::Tcp,
            PROTO_UDP => NextProtocol::Udp,
            PROTO_IPV6 => NextProtocol::IPv6,
            PROTO_IPV6_ROUTE => NextProtocol::Routing,
            PROTO_IPV6_FRAG => NextProtocol::Fragment,
            PROTO_IPV6_AUTH => NextProtocol::Authentication,
            PROTO_ICMPV6 => NextProtocol::Icmpv6,
            PROTO_IPV6_DESTOPT => NextProtocol::Destination,
            PROTO_IPV6_MOB => NextProtocol::Mobility,
            PROTO_IPV6_HOSTID => NextProtocol::HostId,
            _ => NextProtocol::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NextProtocol::Icmp => "ICMP",
            NextProtocol::Igmp => "IGMP",
            NextProtocol::Tcp => "TCP",
            NextProtocol::Udp => "UDP",
            NextProtocol::Icmpv6 => "ICMPv6",
            NextProtocol::IPv6 => "IPv6",
            NextProtocol::HopByHop => "IPv6 Hop-by-Hop",
            NextProtocol::Routing => "IPv6 Routing",
            NextProtocol::Fragment => "IPv6 Fragment",
            NextProtocol::Authentication => "IPv6 Authentication",
            NextProtocol::Destination => "IPv6 Destination",
            NextProtocol::Mobility => "IPv6 Mobility",
            NextProtocol::HostId => "IPv6 Host ID",
            NextProtocol::Unknown => "UNKNOWN",
        }
    }
}

/// 1フレーム分の解析結果ツリー。構築は一度きりで、以後は読み取り専用。
/// 下位レイヤーの解析失敗はそのレイヤー以下が None になるだけで、
/// 解析済みの上位レイヤーは保持される。
#[derive(Debug, Clone)]
pub struct Packet<'a> {
    data: &'a [u8],
    payload: &'a [u8],
    payload_length: usize,
    ethernet: Option<Ethernet<'a>>,
    ipv4: Option<Ipv4<'a>>,
    ipv6: Option<Ipv6<'a>>,
    tcp: Option<Tcp<'a>>,
    udp: Option<Udp>,
    dns: Option<Dns>,
    http: Option<Http<'a>>,
    irc: Option<Irc>,
}

impl<'a> Packet<'a> {
    pub fn parse(data: &'a [u8]) -> Self {
        let mut payload: &'a [u8] = data;
        let mut payload_length = data.len();
        let mut ipv4 = None;
        let mut ipv6 = None;
        let mut tcp = None;
        let mut udp = None;
        let mut dns = None;
        let mut http = None;
        let mut irc = None;

        let ethernet = match Ethernet::parse(data) {
            Ok(header) => Some(header),
            Err(error) => {
                debug!("イーサネットヘッダーを解析できません: {}", error);
                None
            }
        };

        let mut next_protocol = NextProtocol::Unknown;

        if let Some(header) = &ethernet {
            payload = header.payload();
            payload_length = payload.len();

            match header.ether_type {
                EtherType::IPv4 => match Ipv4::parse(payload) {
                    Ok(ip) => {
                        payload = ip.payload();
                        payload_length = ip.payload_length();
                        next_protocol = ip.next_protocol();
                        ipv4 = Some(ip);
                    }
                    Err(error) => debug!("IPv4ヘッダーを解析できません: {}", error),
                },
                EtherType::IPv6 => match Ipv6::parse(payload) {
                    Ok(ip) => {
                        payload = ip.payload();
                        payload_length = payload.len();
                        next_protocol = ip.next_protocol();
                        ipv6 = Some(ip);
                    }
                    Err(error) => debug!("IPv6ヘッダーを解析できません: {}", error),
                },
                _ => {}
            }
        }

        match next_protocol {
            NextProtocol::Udp => match Udp::parse(payload) {
                Ok(header) => {
                    // Packet のペイロードビューは元フレーム上の同じ領域を指す
                    // (UDP自身は所有コピーを保持する)
                    let end = (udp::UDP_HEADER_LEN + header.payload_length()).min(payload.len());
                    payload = &payload[udp::UDP_HEADER_LEN..end];
                    payload_length = header.payload_length();
                    udp = Some(header);
                }
                Err(error) => debug!("UDPヘッダーを解析できません: {}", error),
            },
            NextProtocol::Tcp => match Tcp::parse(payload) {
                Ok(header) => {
                    payload = header.payload();
                    payload_length = payload.len();
                    tcp = Some(header);
                }
                Err(error) => debug!("TCPヘッダーを解析できません: {}", error),
            },
            _ => {}
        }

        if let Some(header) = &udp {
            if header.source_port == DNS_PORT || header.destination_port == DNS_PORT {
                dns = Some(Dns::parse(header.payload()));
            }
        }

        if let Some(header) = &tcp {
            let source = header.source_port;
            let destination = header.destination_port;

            if source == DNS_PORT || destination == DNS_PORT {
                // DNS over TCP: 2バイトの長さプレフィックスが残量に収まる
                // 場合のみDNSとして解釈する
                if payload.len() >= 2 {
                    let dns_length = u16::from_be_bytes([payload[0], payload[1]]) as usize;
                    if dns_length <= payload.len() {
                        dns = Some(Dns::parse(&payload[2..]));
                    }
                }
            }

            if source == HTTP_PORT || destination == HTTP_PORT {
                http = Some(Http::parse(payload));
            }

            if source == IRC_PORT || destination == IRC_PORT {
                irc = Some(Irc::parse(payload));
            }
        }

        Packet {
            data,
            payload,
            payload_length,
            ethernet,
            ipv4,
            ipv6,
            tcp,
            udp,
            dns,
            http,
            irc,
        }
    }

    /// フレーム全体の長さ。
    pub fn length(&self) -> usize {
        self.data.len()
    }

    pub fn raw_data(&self) -> &'a [u8] {
        self.data
    }

    /// 最後に認識されたヘッダーの後ろから始まるペイロードビュー。
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn payload_length(&self) -> usize {
        self.payload_length
    }

    pub fn ethernet(&self) -> Option<&Ethernet<'a>> {
        self.ethernet.as_ref()
    }

    pub fn ipv4(&self) -> Option<&Ipv4<'a>> {
        self.ipv4.as_ref()
    }

    pub fn ipv6(&self) -> Option<&Ipv6<'a>> {
        self.ipv6.as_ref()
    }

    pub fn tcp(&self) -> Option<&Tcp<'a>> {
        self.tcp.as_ref()
    }

    pub fn udp(&self) -> Option<&Udp> {
        self.udp.as_ref()
    }

    pub fn dns(&self) -> Option<&Dns> {
        self.dns.as_ref()
    }

    pub fn http(&self) -> Option<&Http<'a>> {
        self.http.as_ref()
    }

    pub fn irc(&self) -> Option<&Irc> {
        self.irc.as_ref()
    }
}
