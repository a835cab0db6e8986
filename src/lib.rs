//! キャプチャ済みネットワークフレームを構造化されたプロトコルレコード群に
//! 解析する読み取り専用ライブラリ。1フレーム分のバッファを受け取り、
//! リンク層からアプリケーション層までを一度の構築パスで解析する。

pub mod application;
pub mod error;
pub mod network;
pub mod reader;
pub mod record;

pub use application::dns::Dns;
pub use application::http::Http;
pub use application::irc::Irc;
pub use application::telnet::Telnet;
pub use error::{DissectError, Result};
pub use network::packet::Packet;
pub use reader::ByteReader;
pub use record::PacketRecord;
