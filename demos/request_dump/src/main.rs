//! リクエストをパースして内容を表示する例
//!
//! 使い方:
//!   # ファイルを 1 バイトずつパース
//!   cargo run -p request_dump -- request.txt
//!
//!   # 標準入力を 16 バイトずつパース
//!   printf 'GET / HTTP/1.1\r\n\r\n' | cargo run -p request_dump -- --chunk-size 16
//!
//!   # TCP で待ち受けて受信したリクエストを表示 (ポート 8080)
//!   cargo run -p request_dump -- --listen

use std::io::Read;

use http11_request::{ParseState, Request, RequestAssembler};
use tokio_http11_request::Server;

struct DumpOptions {
    chunk_size: usize,
    listen: bool,
    port: u16,
    path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args()?;

    if options.listen {
        let addr = format!("0.0.0.0:{}", options.port);
        let server = Server::bind(&addr).await?;
        println!("Listening on http://{}", addr);
        server.serve(handle).await?;
        return Ok(());
    }

    let input = if options.path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(&options.path)?
    };
    dump_stream(&input, options.chunk_size)?;
    Ok(())
}

fn parse_args() -> Result<DumpOptions, Box<dyn std::error::Error>> {
    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "request_dump";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --listen フラグ
    let listen: bool = noargs::flag("listen")
        .short('l')
        .doc("Listen on TCP and dump received requests")
        .take(&mut args)
        .is_present();

    // --port オプション
    let port: u16 = noargs::opt("port")
        .short('p')
        .doc("Port to listen on")
        .default("8080")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --chunk-size オプション
    let chunk_size: usize = noargs::opt("chunk-size")
        .short('c')
        .doc("Number of bytes passed to the parser at a time")
        .default("1")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;
    if chunk_size == 0 {
        return Err("--chunk-size must be greater than 0".into());
    }

    // 位置引数: FILE
    let path: String = noargs::arg("[FILE]")
        .doc("File to parse (\"-\" for stdin)")
        .default("-")
        .take(&mut args)
        .then(|a| Ok::<_, &str>(a.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        std::process::exit(0);
    }

    Ok(DumpOptions {
        chunk_size,
        listen,
        port,
        path,
    })
}

/// 入力を chunk_size ずつパーサーに渡し、完了したリクエストを順に表示する
fn dump_stream(input: &[u8], chunk_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut assembler = RequestAssembler::new();
    let mut fed = 0usize;
    let mut header_reported = false;

    for chunk in input.chunks(chunk_size) {
        assembler.try_append(chunk)?;
        fed += chunk.len();

        if assembler.header_complete() && !header_reported {
            header_reported = true;
            println!("-- header complete after {} bytes", fed);
        }

        // パイプライン化されたリクエストは完了するたびに取り出す
        while assembler.is_complete() {
            let remaining = assembler.take_remaining();
            print_request(&assembler.into_request()?);
            assembler = RequestAssembler::new();
            header_reported = false;
            if remaining.is_empty() {
                break;
            }
            assembler.try_append(&remaining)?;
            if assembler.header_complete() {
                header_reported = true;
                println!("-- header complete after {} bytes", fed);
            }
        }
    }

    // 末尾の空行だけが残っている場合は何もしない
    if assembler.state() != ParseState::AwaitingRequestLine || assembler.buffered_len() > 0 {
        assembler.try_end_of_input()?;
        print_request(&assembler.into_request()?);
    }
    Ok(())
}

fn print_request(request: &Request) {
    println!("{} {} {}", request.method, request.target, request.version);
    println!("  target form: {:?}", request.target_form());
    println!("  framing: {:?}", request.framing);
    for (name, value) in request.headers.iter() {
        println!("  {}: {}", name, value);
    }
    println!("  body: {} bytes", request.body.len());
    for chunk in request.body.chunks() {
        println!("    chunk: {} bytes {}", chunk.size, chunk.extensions);
    }
    for (name, value) in request.body.trailers().iter() {
        println!("  trailer {}: {}", name, value);
    }
}

async fn handle(request: Request) -> Vec<u8> {
    print_request(&request);

    let body = format!(
        "{} {} parsed ({} headers, {} body bytes)\n",
        request.method,
        request.target,
        request.headers.len(),
        request.body.len()
    );
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body.as_bytes());
    response
}
