use crate::reader::ByteReader;

pub const REQUEST_METHODS: [&str; 8] = [
    "OPTIONS", "GET", "HEAD", "POST", "PUT", "DELETE", "TRACE", "CONNECT",
];

pub const PROTOCOL_VERSIONS: [&str; 5] =
    ["HTTP/0.9", "HTTP/1.0", "HTTP/1.1", "HTTP/2.0", "HTTP/3.0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpKind {
    Request,
    Response,
    /// 先頭トークンがメソッドにもバージョンにも一致しない。
    Unrecognized,
}

/// ヘッダーは生の行のまま順序を保って保持し、ボディは元バッファへの
/// 借用ビューとする (ゼロコピー)。
#[derive(Debug, Clone)]
pub struct Http<'a> {
    pub kind: HttpKind,
    pub method: String,
    pub uri: String,
    pub version: String,
    pub status_code: String,
    pub response_phrase: String,
    pub headers: Vec<String>,
    body: &'a [u8],
}

impl<'a> Http<'a> {
    pub fn parse(data: &'a [u8]) -> Self {
        let mut http = Http {
            kind: HttpKind::Unrecognized,
            method: String::new(),
            uri: String::new(),
            version: String::new(),
            status_code: String::new(),
            response_phrase: String::new(),
            headers: Vec::new(),
            body: &[],
        };

        let mut reader = ByteReader::new(data);

        let first = next_token(&mut reader);
        if REQUEST_METHODS.contains(&first.as_str()) {
            http.kind = HttpKind::Request;
            http.method = first;
            http.uri = next_token(&mut reader);
            http.version = next_line_or_rest(&mut reader);
            http.headers = parse_headers(&mut reader);
            http.body = reader.rest();
            return http;
        }

        // メソッドでなければカーソルを先頭に戻してレスポンスとして再解釈する
        reader.set_position(0);
        let version = next_token(&mut reader);
        if PROTOCOL_VERSIONS.contains(&version.as_str()) {
            http.kind = HttpKind::Response;
            http.version = version;
            http.status_code = next_token(&mut reader);
            http.response_phrase = next_line_or_rest(&mut reader);
            http.headers = parse_headers(&mut reader);
            http.body = reader.rest();
        }

        http
    }

    pub fn is_request(&self) -> bool {
        self.kind == HttpKind::Request
    }

    pub fn is_response(&self) -> bool {
        self.kind == HttpKind::Response
    }

    /// 名前でヘッダー値を引く。値の先頭スペースは1つだけ取り除かれる。
    pub fn header(&self, name: &str) -> Option<&str> {
        for line in &self.headers {
            if let Some((key, value)) = line.split_once(':') {
                if key == name {
                    return Some(value.strip_prefix(' ').unwrap_or(value));
                }
            }
        }
        None
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn body_length(&self) -> usize {
        self.body.len()
    }
}

fn next_token(reader: &mut ByteReader) -> String {
    let (token, _) = reader.read_until(|byte| byte == 0 || byte == b' ');
    String::from_utf8_lossy(token).into_owned()
}

fn next_line_or_rest(reader: &mut ByteReader) -> String {
    match reader.read_line() {
        Ok(line) => String::from_utf8_lossy(line).into_owned(),
        Err(_) => {
            let rest = reader.rest();
            let length = rest.len();
            let _ = reader.advance(length);
            String::from_utf8_lossy(rest).into_owned()
        }
    }
}

/// 空行までのヘッダー行を読む。コロンを含まない行で打ち切る。
/// 空行の前にバッファが尽きた場合は残りを読み捨て、ボディ長は0になる。
fn parse_headers(reader: &mut ByteReader) -> Vec<String> {
    let mut headers = Vec::new();

    loop {
        let line = match reader.read_line() {
            Ok(line) => line,
            Err(_) => {
                let remaining = reader.remaining();
                let _ = reader.advance(remaining);
                break;
            }
        };
        if line.is_empty() {
            break;
        }

        let text = String::from_utf8_lossy(line);
        if !text.contains(':') {
            break;
        }
        headers.push(text.into_owned());
    }

    headers
}
