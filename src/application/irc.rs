use crate::application::{is_printable, percent_hexa};
use crate::reader::ByteReader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Irc {
    pub messages: Vec<IrcMessage>,
}

impl Irc {
    pub fn parse(data: &[u8]) -> Self {
        let mut reader = ByteReader::new(data);
        let mut messages = Vec::new();

        while !reader.is_empty() {
            let mut message = IrcMessage::default();

            if reader.peek() == Some(b':') {
                let _ = reader.advance(1);
                message.prefix = Some(next_token(&mut reader));
            }

            message.command = next_token(&mut reader);

            loop {
                let start = reader.position();
                let param = next_token(&mut reader);

                if param.is_empty() {
                    break;
                }

                if param.starts_with(':') {
                    // トレーリングパラメータ: トークナイザの消費を巻き戻して
                    // 行全体を読み直す (埋め込みスペースを保持するため)
                    reader.set_position(start + 1);
                    message.trailing = Some(next_line_escaped(&mut reader));
                    break;
                }

                message.params.push(param);
            }

            messages.push(message);
        }

        Irc { messages }
    }
}

/// スペース・NUL・非印字文字のいずれかで終わるトークンを読む。
fn next_token(reader: &mut ByteReader) -> String {
    let (token, _) = reader.read_until(|byte| byte == b' ' || !is_printable(byte));
    String::from_utf8_lossy(token).into_owned()
}

fn next_line_escaped(reader: &mut ByteReader) -> String {
    let line = match reader.read_line() {
        Ok(line) => line,
        Err(_) => {
            let rest = reader.rest();
            let length = rest.len();
            let _ = reader.advance(length);
            rest
        }
    };

    let mut text = String::new();
    for &byte in line {
        if is_printable(byte) {
            text.push(byte as char);
        } else {
            text.push_str(&percent_hexa(byte));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg_with_prefix_and_trailing() {
        let data = b":nick!u@h PRIVMSG #c :hello there\r\n";
        let irc = Irc::parse(data);

        assert_eq!(irc.messages.len(), 1);
        let message = &irc.messages[0];
        assert_eq!(message.prefix.as_deref(), Some("nick!u@h"));
        assert_eq!(message.command, "PRIVMSG");
        assert_eq!(message.params, vec!["#c"]);
        assert_eq!(message.trailing.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_parse_command_without_prefix() {
        let data = b"NICK newnick\r\n";
        let irc = Irc::parse(data);

        let message = &irc.messages[0];
        assert_eq!(message.prefix, None);
        assert_eq!(message.command, "NICK");
        assert_eq!(message.params, vec!["newnick"]);
        assert_eq!(message.trailing, None);
    }

    #[test]
    fn test_parse_multiple_messages() {
        let data = b"PING :server1\r\n:irc.example.com PONG server1 :server1\r\n";
        let irc = Irc::parse(data);

        assert_eq!(irc.messages.len(), 2);
        assert_eq!(irc.messages[0].command, "PING");
        assert_eq!(irc.messages[0].trailing.as_deref(), Some("server1"));
        assert_eq!(irc.messages[1].prefix.as_deref(), Some("irc.example.com"));
        assert_eq!(irc.messages[1].command, "PONG");
        assert_eq!(irc.messages[1].params, vec!["server1"]);
        assert_eq!(irc.messages[1].trailing.as_deref(), Some("server1"));
    }

    #[test]
    fn test_trailing_preserves_embedded_spaces() {
        let data = b"TOPIC #rust :a topic  with   spaces\r\n";
        let irc = Irc::parse(data);

        let message = &irc.messages[0];
        assert_eq!(message.params, vec!["#rust"]);
        assert_eq!(message.trailing.as_deref(), Some("a topic  with   spaces"));
    }

    #[test]
    fn test_non_printable_bytes_in_trailing_are_escaped() {
        let data = b"PRIVMSG #c :ding\x07dong\r\n";
        let irc = Irc::parse(data);

        assert_eq!(
            irc.messages[0].trailing.as_deref(),
            Some("ding%07dong")
        );
    }

    #[test]
    fn test_empty_buffer() {
        let irc = Irc::parse(b"");
        assert!(irc.messages.is_empty());
    }
}
