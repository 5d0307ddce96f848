use std::{env, io, process::ExitCode, time::Duration};
use urlstream::{StreamBuf, option::UserAgent};

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: fetch <url> [timeout-ms]");
        return ExitCode::FAILURE;
    };

    let mut stream = StreamBuf::new();
    stream.set_option(UserAgent(concat!("fetch/", env!("CARGO_PKG_VERSION")).into()));
    if let Some(timeout) = args.next() {
        match timeout.parse() {
            Ok(ms) => stream.set_read_timeout(Duration::from_millis(ms)),
            Err(err) => {
                eprintln!("invalid timeout `{timeout}`: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let Err(err) = stream.open(url.as_str()) {
        eprintln!("{url}: {err}");
        if !stream.is_open() {
            return ExitCode::FAILURE;
        }
    }

    if let Some(url) = stream.url() {
        eprintln!("> {url}");
    }
    if let Some(status) = stream.status() {
        eprintln!("< {status}");
    }
    eprint!("{}", stream.headers());
    eprintln!("content-type: {:?}", stream.content_type());
    eprintln!("content-length: {:?}", stream.content_length());

    if let Err(err) = io::copy(&mut stream, &mut io::stdout().lock()) {
        eprintln!("{url}: {err}");
        return ExitCode::FAILURE;
    }

    match stream.error() {
        Some(_) => ExitCode::FAILURE,
        None => ExitCode::SUCCESS,
    }
}
