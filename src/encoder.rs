use crate::framing::BodyFraming;
use crate::request::Request;

/// リクエストをエンコード
///
/// フレーミングに従ってボディを書き出す。
/// 固定長で Content-Length も Transfer-Encoding もない場合は Content-Length を補う。
/// chunked の場合は受信したチャンク単位で書き出し、トレーラーも含める。
pub fn encode_request(request: &Request) -> Vec<u8> {
    let mut buf = encode_request_headers(request);
    // 空行の前に補うヘッダーを差し込むため、いったん終端の CRLF を外す
    buf.truncate(buf.len() - 2);

    let body = request.body.as_bytes();
    match request.framing {
        BodyFraming::Chunked => {
            if !request.is_chunked_declared() {
                buf.extend_from_slice(b"Transfer-Encoding: chunked\r\n");
            }
            buf.extend_from_slice(b"\r\n");
            if request.body.chunks().is_empty() {
                if !body.is_empty() {
                    buf.extend_from_slice(&encode_chunk(body));
                }
            } else {
                for chunk in request.body.chunks() {
                    buf.extend_from_slice(format!("{:x}", chunk.size).as_bytes());
                    if !chunk.extensions.is_empty() {
                        buf.push(b';');
                        buf.extend_from_slice(chunk.extensions.as_bytes());
                    }
                    buf.extend_from_slice(b"\r\n");
                    buf.extend_from_slice(request.body.chunk_data(chunk));
                    buf.extend_from_slice(b"\r\n");
                }
            }
            buf.extend_from_slice(b"0\r\n");
            for (name, value) in request.body.trailers().iter() {
                push_field(&mut buf, name, value);
            }
            buf.extend_from_slice(b"\r\n");
        }
        BodyFraming::None | BodyFraming::Fixed(_) | BodyFraming::UntilClose => {
            if !body.is_empty()
                && request.framing != BodyFraming::UntilClose
                && !request.has_header("Content-Length")
                && !request.has_header("Transfer-Encoding")
            {
                push_field(&mut buf, "Content-Length", &body.len().to_string());
            }
            buf.extend_from_slice(b"\r\n");
            buf.extend_from_slice(body);
        }
    }

    buf
}

/// リクエストラインとヘッダーのみをエンコード (ボディなし)
///
/// ヘッダー送信後に `encode_chunk` でボディを送信できる。
pub fn encode_request_headers(request: &Request) -> Vec<u8> {
    let mut buf = Vec::new();

    // Request line: METHOD SP TARGET SP VERSION CRLF
    buf.extend_from_slice(request.method.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(request.target.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(request.version.as_str().as_bytes());
    buf.extend_from_slice(b"\r\n");

    for (name, value) in request.headers.iter() {
        push_field(&mut buf, name, value);
    }

    // End of headers
    buf.extend_from_slice(b"\r\n");

    buf
}

fn push_field(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

impl Request {
    /// リクエストをバイト列にエンコード
    pub fn encode(&self) -> Vec<u8> {
        encode_request(self)
    }

    /// ヘッダーのみをエンコード (Chunked Transfer Encoding 用)
    pub fn encode_headers(&self) -> Vec<u8> {
        encode_request_headers(self)
    }

    fn is_chunked_declared(&self) -> bool {
        self.headers
            .tokens("Transfer-Encoding")
            .any(|t| t.eq_ignore_ascii_case("chunked"))
    }
}

/// Chunked Transfer Encoding 用のチャンクをエンコード
///
/// 空のデータを渡すと終端チャンク (0\r\n\r\n) を生成する。
pub fn encode_chunk(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();

    if data.is_empty() {
        // 終端チャンク
        buf.extend_from_slice(b"0\r\n\r\n");
    } else {
        buf.extend_from_slice(format!("{:x}\r\n", data.len()).as_bytes());
        buf.extend_from_slice(data);
        buf.extend_from_slice(b"\r\n");
    }

    buf
}

/// 複数のデータを chunked 形式でエンコード
///
/// 空のデータは読み飛ばし、最後に終端チャンクを追加する。
pub fn encode_chunks(chunks: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::new();

    for chunk in chunks.iter().filter(|c| !c.is_empty()) {
        buf.extend_from_slice(&encode_chunk(chunk));
    }

    // 終端チャンク
    buf.extend_from_slice(b"0\r\n\r\n");

    buf
}
