use crate::application::{is_printable, percent_hexa};

/// Telnet の Interpret As Command バイト。
pub const IAC: u8 = 255;

#[derive(Debug, Clone, Default)]
pub struct Telnet {
    pub is_command: bool,
    pub data: String,
}

impl Telnet {
    pub fn parse(data: &[u8]) -> Self {
        if data.is_empty() {
            return Telnet::default();
        }

        if data[0] == IAC {
            // コマンド列の解読は未実装。分類結果のみを返す。
            return Telnet {
                is_command: true,
                data: String::new(),
            };
        }

        let mut text = String::new();
        for &byte in data {
            if is_printable(byte) || is_space(byte) {
                text.push(byte as char);
            } else {
                text.push_str(&percent_hexa(byte));
            }
        }

        Telnet {
            is_command: false,
            data: text,
        }
    }

    pub fn is_data(&self) -> bool {
        !self.is_command
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// C の isspace 相当。
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

pub fn command_name(code: u8) -> &'static str {
    match code {
        240 => "SE",
        241 => "NOP",
        242 => "DM",
        243 => "BRK",
        244 => "IP",
        245 => "AO",
        246 => "AYT",
        247 => "EC",
        248 => "EL",
        249 => "GA",
        250 => "SB",
        251 => "WILL",
        252 => "WONT",
        253 => "DO",
        254 => "DONT",
        255 => "IAC",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_classification() {
        let telnet = Telnet::parse(&[IAC, 251, 1]); // IAC WILL ECHO
        assert!(telnet.is_command);
        assert!(!telnet.is_data());
        assert!(telnet.is_empty());
    }

    #[test]
    fn test_data_classification() {
        let telnet = Telnet::parse(b"login: admin\r\n");
        assert!(telnet.is_data());
        assert_eq!(telnet.data, "login: admin\r\n");
    }

    #[test]
    fn test_non_printable_data_is_escaped() {
        let telnet = Telnet::parse(&[b'a', 0x98, b'b', 0x00]);
        assert_eq!(telnet.data, "a%98b%00");
    }

    #[test]
    fn test_whitespace_kept_verbatim() {
        let telnet = Telnet::parse(b"a\tb\nc");
        assert_eq!(telnet.data, "a\tb\nc");
    }

    #[test]
    fn test_empty_input() {
        let telnet = Telnet::parse(&[]);
        assert!(telnet.is_data());
        assert!(telnet.is_empty());
    }

    #[test]
    fn test_command_names() {
        assert_eq!(command_name(251), "WILL");
        assert_eq!(command_name(255), "IAC");
        assert_eq!(command_name(240), "SE");
        assert_eq!(command_name(10), "UNKNOWN");
    }
}
