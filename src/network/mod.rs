pub mod packet;

pub use packet::Packet;
