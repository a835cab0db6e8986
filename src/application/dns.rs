use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{Local, TimeZone};

use crate::reader::ByteReader;

pub const DNS_HEADER_LEN: usize = 12;
/// 名前解凍で許容するステップ数 (ラベル読み取り + ポインタジャンプ) の上限。
/// 自己参照ポインタでも必ず停止する。
pub const MAX_NAME_HOPS: usize = 256;

/// 1つのDNSメッセージの解析結果。各セクションのエントリは
/// 「名前 タイプ (rdata)」形式の文字列に整形される。
#[derive(Debug, Clone, Default)]
pub struct Dns {
    pub qr: u8,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub authoritatives: Vec<String>,
    pub additionals: Vec<String>,
}

impl Dns {
    pub fn parse(data: &[u8]) -> Self {
        let mut dns = Dns::default();

        if data.len() < DNS_HEADER_LEN {
            return dns;
        }

        dns.qr = data[2] >> 7;
        dns.question_count = u16::from_be_bytes([data[4], data[5]]);
        dns.answer_count = u16::from_be_bytes([data[6], data[7]]);
        dns.authority_count = u16::from_be_bytes([data[8], data[9]]);
        dns.additional_count = u16::from_be_bytes([data[10], data[11]]);

        let mut reader = ByteReader::new(data);
        if reader.advance(DNS_HEADER_LEN).is_err() {
            return dns;
        }

        // 各セクションはカウント分を順に読む。途中で尽きた場合は
        // そこまでの結果を保持したまま打ち切る。
        for _ in 0..dns.question_count {
            match parse_question(&mut reader) {
                Some(question) => dns.questions.push(question),
                None => return dns,
            }
        }

        for _ in 0..dns.answer_count {
            match parse_record(&mut reader) {
                Some(record) => dns.answers.push(record),
                None => return dns,
            }
        }

        for _ in 0..dns.authority_count {
            match parse_record(&mut reader) {
                Some(record) => dns.authoritatives.push(record),
                None => return dns,
            }
        }

        for _ in 0..dns.additional_count {
            match parse_record(&mut reader) {
                Some(record) => dns.additionals.push(record),
                None => return dns,
            }
        }

        dns
    }

    pub fn is_response(&self) -> bool {
        self.qr == 1
    }
}

fn parse_question(reader: &mut ByteReader) -> Option<String> {
    let name = parse_name(reader);
    let rtype = reader.read_u16().ok()?;
    reader.advance(2).ok()?; // class

    Some(format!("{} {}", name, rr_type_name(rtype)))
}

fn parse_record(reader: &mut ByteReader) -> Option<String> {
    let name = parse_name(reader);
    let rtype = reader.read_u16().ok()?;
    reader.advance(2).ok()?; // class
    reader.advance(4).ok()?; // TTL
    let rdlength = reader.read_u16().ok()?;

    // 型別デコーダが実際に何バイト消費したかに関わらず、rdata の後の
    // カーソルは必ず rdata_start + rdlength に揃える (圧縮名が含まれる
    // rdata では消費量とrdlengthが一致しない)。
    let rdata_start = reader.position();
    let rdata = parse_rdata(reader, rtype, rdlength);
    reader.set_position(rdata_start + rdlength as usize);

    Some(format!("{} {} {}", name, rr_type_name(rtype), rdata))
}

/// 圧縮されたドメイン名を読み取り、ドット区切り文字列に展開する。
///
/// 0xC0 以上の長さバイトはメッセージ先頭からの14ビットオフセットを指す
/// 圧縮ポインタ。最初のポインタに遭遇した時点のカーソル位置 (ポインタ
/// 2バイトの直後) が呼び出し元の再開位置になり、以降のジャンプ回数には
/// 影響されない。ポインタが無ければ終端の0バイトの次が再開位置。
fn parse_name(reader: &mut ByteReader) -> String {
    let mut name = String::new();
    let mut resume: Option<usize> = None;
    let mut hops = 0;
    let mut terminated = false;

    loop {
        if hops >= MAX_NAME_HOPS {
            break;
        }
        hops += 1;

        let length = match reader.peek() {
            Some(byte) => byte,
            None => break,
        };

        if length == 0 {
            terminated = true;
            break;
        }

        if length < 0xc0 {
            if reader.advance(1).is_err() {
                break;
            }
            match reader.read_bytes(length as usize) {
                Ok(label) => {
                    name.push_str(&String::from_utf8_lossy(label));
                    name.push('.');
                }
                Err(_) => break,
            }
        } else {
            let first = match reader.read_u8() {
                Ok(byte) => byte,
                Err(_) => break,
            };
            let second = match reader.read_u8() {
                Ok(byte) => byte,
                Err(_) => break,
            };

            if resume.is_none() {
                resume = Some(reader.position());
            }

            let offset = (usize::from(first & 0x3f) << 8) | usize::from(second);
            reader.set_position(offset);
        }
    }

    match resume {
        Some(position) => reader.set_position(position),
        None => {
            if terminated {
                let position = reader.position();
                reader.set_position(position + 1);
            }
        }
    }

    if name.is_empty() {
        name.push('.');
    } else {
        name.pop();
    }

    name
}

fn parse_rdata(reader: &mut ByteReader, rtype: u16, rdlength: u16) -> String {
    let rdata_start = reader.position();

    match rtype {
        1 => match reader.read_bytes(4) {
            // A
            Ok(bytes) => Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]).to_string(),
            Err(_) => "INVALID IP".to_string(),
        },
        2 | 5 | 12 => parse_name(reader), // NS / CNAME / PTR
        6 => {
            // SOA
            let mname = parse_name(reader);
            let rname = parse_name(reader);
            let serial = reader.read_u32().unwrap_or_default();
            let refresh = reader.read_u32().unwrap_or_default();
            let retry = reader.read_u32().unwrap_or_default();
            let expire = reader.read_u32().unwrap_or_default();
            let minimum = reader.read_u32().unwrap_or_default();

            format!(
                "\"{} {} {} {} {} {} {}\"",
                mname, rname, serial, refresh, retry, expire, minimum
            )
        }
        15 => {
            // MX
            let preference = reader.read_u16().unwrap_or_default() as i16;
            let exchange = parse_name(reader);
            format!("{} {}", preference, exchange)
        }
        28 => match reader.read_bytes(16) {
            // AAAA
            Ok(bytes) => {
                let mut address = [0u8; 16];
                address.copy_from_slice(bytes);
                Ipv6Addr::from(address).to_string()
            }
            Err(_) => "INVALID IPv6".to_string(),
        },
        43 => {
            // DS
            let key_tag = reader.read_u16().unwrap_or_default();
            let algorithm = reader.read_u8().unwrap_or_default();
            let digest_type = reader.read_u8().unwrap_or_default();
            let digest = hex_remaining(reader, rdata_start, rdlength);

            format!(
                "\"{} {} {} {}\"",
                key_tag,
                dnssec_algorithm_name(algorithm),
                digest_type_name(digest_type),
                digest
            )
        }
        46 => {
            // RRSIG
            let type_covered = reader.read_u16().unwrap_or_default();
            let algorithm = reader.read_u8().unwrap_or_default();
            let labels = reader.read_u8().unwrap_or_default();
            let original_ttl = reader.read_u32().unwrap_or_default();
            let expiration = reader.read_u32().unwrap_or_default();
            let inception = reader.read_u32().unwrap_or_default();
            let key_tag = reader.read_u16().unwrap_or_default();
            let signer = parse_name(reader);
            let signature = hex_remaining(reader, rdata_start, rdlength);

            format!(
                "\"{} {} {} {} {} {} {} {} {}\"",
                rr_type_name(type_covered),
                dnssec_algorithm_name(algorithm),
                labels,
                original_ttl,
                format_timestamp(expiration),
                format_timestamp(inception),
                key_tag,
                signer,
                signature
            )
        }
        47 => {
            // NSEC
            let next_name = parse_name(reader);
            let bitmap = hex_remaining(reader, rdata_start, rdlength);
            format!("\"{} {}\"", next_name, bitmap)
        }
        48 => {
            // DNSKEY
            let flags = hex::encode(reader.read_bytes(2).unwrap_or(&[]));
            let protocol = reader.read_u8().unwrap_or_default();
            let algorithm = reader.read_u8().unwrap_or_default();
            let public_key = hex_remaining(reader, rdata_start, rdlength);

            format!(
                "\"0x{} {} {} {}\"",
                flags,
                protocol,
                dnssec_algorithm_name(algorithm),
                public_key
            )
        }
        _ => {
            let take = (rdlength as usize).min(reader.remaining());
            hex::encode(reader.read_bytes(take).unwrap_or(&[]))
        }
    }
}

/// rdata 内で未消費の残りバイトを16進文字列にする。
fn hex_remaining(reader: &mut ByteReader, rdata_start: usize, rdlength: u16) -> String {
    let consumed = reader.position().saturating_sub(rdata_start);
    let take = (rdlength as usize)
        .saturating_sub(consumed)
        .min(reader.remaining());
    hex::encode(reader.read_bytes(take).unwrap_or(&[]))
}

fn format_timestamp(epoch: u32) -> String {
    Local
        .timestamp_opt(i64::from(epoch), 0)
        .earliest()
        .map(|datetime| datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

pub fn rr_type_name(rtype: u16) -> &'static str {
    match rtype {
        1 => "A",
        2 => "NS",
        3 => "MD",
        4 => "MF",
        5 => "CNAME",
        6 => "SOA",
        7 => "MB",
        8 => "MG",
        9 => "MR",
        10 => "NULL",
        11 => "WKS",
        12 => "PTR",
        13 => "HINFO",
        14 => "MINFO",
        15 => "MX",
        16 => "TXT",
        28 => "AAAA",
        33 => "SRV",
        41 => "OPT",
        43 => "DS",
        46 => "RRSIG",
        47 => "NSSEC",
        48 => "DNSKEY",
        50 => "NSEC3",
        _ => "UNKNOWN",
    }
}

pub fn dnssec_algorithm_name(algorithm: u8) -> &'static str {
    match algorithm {
        1 => "RSA/MD5",
        2 => "DH",
        3 => "DSA/SHA-1",
        4 => "ECC",
        5 => "RSA/SHA-1",
        6 => "DSA-NSEC3-SHA1",
        7 => "RSASHA1-NSEC3-SHA1",
        8 => "RSA/SHA-256",
        10 => "RSA/SHA-512",
        12 => "ECC-GOST",
        13 => "ECDSAP256SHA256",
        14 => "ECDSAP384SHA384",
        15 => "ED25519",
        16 => "ED448",
        252 => "INDIRECT",
        253 => "PRIVATEDNS",
        254 => "PRIVATEOID",
        _ => "UNKNOWN",
    }
}

pub fn digest_type_name(digest_type: u8) -> &'static str {
    match digest_type {
        1 => "SHA-1",
        2 => "SHA-256",
        3 => "ECC-GOST",
        4 => "SHA-384",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(qr: u8, qdcount: u16, ancount: u16) -> Vec<u8> {
        let qd = qdcount.to_be_bytes();
        let an = ancount.to_be_bytes();
        vec![
            0x1a, 0x2b, // id
            qr << 7,
            0x00, // flags
            qd[0], qd[1], an[0], an[1], // qdcount, ancount
            0x00, 0x00, 0x00, 0x00, // nscount, arcount
        ]
    }

    fn encoded_name(labels: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for label in labels {
            bytes.push(label.len() as u8);
            bytes.extend_from_slice(label.as_bytes());
        }
        bytes.push(0);
        bytes
    }

    #[test]
    fn test_parse_query() {
        let mut message = header(0, 1, 0);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // type A, class IN

        let dns = Dns::parse(&message);
        assert_eq!(dns.qr, 0);
        assert!(!dns.is_response());
        assert_eq!(dns.question_count, 1);
        assert_eq!(dns.questions, vec!["example.com A"]);
    }

    #[test]
    fn test_parse_response_with_a_record() {
        let mut message = header(1, 1, 1);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        // 回答の名前は質問名 (オフセット12) への圧縮ポインタ
        message.extend_from_slice(&[0xc0, 0x0c]);
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // type A, class IN
        message.extend_from_slice(&[0x00, 0x00, 0x0e, 0x10]); // TTL 3600
        message.extend_from_slice(&[0x00, 0x04, 93, 184, 216, 34]); // rdlength, rdata

        let dns = Dns::parse(&message);
        assert!(dns.is_response());
        assert_eq!(dns.questions, vec!["example.com A"]);
        assert_eq!(dns.answers, vec!["example.com A 93.184.216.34"]);
    }

    #[test]
    fn test_compression_pointer_resumes_after_two_bytes() {
        // 2つ目の質問の名前はポインタのみ。解凍後のカーソルがポインタの
        // 直後に戻らなければ2つ目のタイプフィールドを読み誤る。
        let mut message = header(0, 2, 0);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        message.extend_from_slice(&[0xc0, 0x0c]); // example.com へのポインタ
        message.extend_from_slice(&[0x00, 0x0f, 0x00, 0x01]); // type MX

        let dns = Dns::parse(&message);
        assert_eq!(dns.questions, vec!["example.com A", "example.com MX"]);
    }

    #[test]
    fn test_partial_label_then_pointer() {
        let mut message = header(0, 2, 0);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        // "www" + example.com へのポインタ
        message.push(3);
        message.extend_from_slice(b"www");
        message.extend_from_slice(&[0xc0, 0x0c]);
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);

        let dns = Dns::parse(&message);
        assert_eq!(dns.questions[1], "www.example.com A");
    }

    #[test]
    fn test_self_referencing_pointer_terminates() {
        let mut message = header(0, 1, 0);
        message.extend_from_slice(&[0xc0, 0x0c]); // 自分自身 (オフセット12) を指す
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);

        let dns = Dns::parse(&message);
        // ホップ上限で打ち切られ、空名がベストエフォートとして返る
        assert_eq!(dns.questions, vec![". A"]);
    }

    #[test]
    fn test_mx_record() {
        let mut message = header(1, 0, 1);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x0f, 0x00, 0x01]); // type MX
        message.extend_from_slice(&[0x00, 0x00, 0x0e, 0x10]);
        let mut rdata = vec![0x00, 0x0a]; // preference 10
        rdata.extend_from_slice(&encoded_name(&["mail", "example", "com"]));
        message.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        message.extend_from_slice(&rdata);

        let dns = Dns::parse(&message);
        assert_eq!(dns.answers, vec!["example.com MX 10 mail.example.com"]);
    }

    #[test]
    fn test_ds_record() {
        let mut message = header(1, 0, 1);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x2b, 0x00, 0x01]); // type DS
        message.extend_from_slice(&[0x00, 0x00, 0x0e, 0x10]);
        message.extend_from_slice(&[0x00, 0x06]); // rdlength
        message.extend_from_slice(&[0x30, 0x39, 8, 2, 0xde, 0xad]);

        let dns = Dns::parse(&message);
        assert_eq!(
            dns.answers,
            vec!["example.com DS \"12345 RSA/SHA-256 SHA-256 dead\""]
        );
    }

    #[test]
    fn test_aaaa_record() {
        let mut message = header(1, 0, 1);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x1c, 0x00, 0x01]); // type AAAA
        message.extend_from_slice(&[0x00, 0x00, 0x0e, 0x10]);
        message.extend_from_slice(&[0x00, 0x10]);
        message.extend_from_slice(&[0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);

        let dns = Dns::parse(&message);
        assert_eq!(dns.answers, vec!["example.com AAAA 2001:db8::1"]);
    }

    #[test]
    fn test_unknown_type_dumps_hex() {
        let mut message = header(1, 0, 1);
        message.extend_from_slice(&encoded_name(&["x"]));
        message.extend_from_slice(&[0x00, 0x63, 0x00, 0x01]); // type 99
        message.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c]);
        message.extend_from_slice(&[0x00, 0x03, 0x01, 0x02, 0x03]);

        let dns = Dns::parse(&message);
        assert_eq!(dns.answers, vec!["x UNKNOWN 010203"]);
    }

    #[test]
    fn test_compressed_name_inside_rdata_forces_cursor() {
        // CNAME の rdata はポインタ2バイトのみ。圧縮で消費量が縮んでも
        // 次のレコードは rdata_start + rdlength から読まれる。
        let mut message = header(1, 1, 2);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        // CNAME レコード
        message.extend_from_slice(&[0xc0, 0x0c]);
        message.extend_from_slice(&[0x00, 0x05, 0x00, 0x01]);
        message.extend_from_slice(&[0x00, 0x00, 0x0e, 0x10]);
        message.extend_from_slice(&[0x00, 0x02, 0xc0, 0x0c]); // rdata = ポインタ
        // 続く A レコード
        message.extend_from_slice(&[0xc0, 0x0c]);
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        message.extend_from_slice(&[0x00, 0x00, 0x0e, 0x10]);
        message.extend_from_slice(&[0x00, 0x04, 10, 0, 0, 1]);

        let dns = Dns::parse(&message);
        assert_eq!(dns.answers[0], "example.com CNAME example.com");
        assert_eq!(dns.answers[1], "example.com A 10.0.0.1");
    }

    #[test]
    fn test_truncated_answer_keeps_questions() {
        let mut message = header(1, 1, 1);
        message.extend_from_slice(&encoded_name(&["example", "com"]));
        message.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        message.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01]); // 回答が途中で切れる

        let dns = Dns::parse(&message);
        assert_eq!(dns.questions, vec!["example.com A"]);
        assert!(dns.answers.is_empty());
    }

    #[test]
    fn test_short_buffer_yields_empty_message() {
        let dns = Dns::parse(&[0x12, 0x34, 0x81]);
        assert_eq!(dns.question_count, 0);
        assert!(dns.questions.is_empty());
    }

    #[test]
    fn test_lookup_tables() {
        assert_eq!(rr_type_name(5), "CNAME");
        assert_eq!(rr_type_name(47), "NSSEC");
        assert_eq!(rr_type_name(999), "UNKNOWN");
        assert_eq!(dnssec_algorithm_name(13), "ECDSAP256SHA256");
        assert_eq!(dnssec_algorithm_name(99), "UNKNOWN");
        assert_eq!(digest_type_name(4), "SHA-384");
        assert_eq!(digest_type_name(9), "UNKNOWN");
    }
}
