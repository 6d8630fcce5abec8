use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

pub mod api;
pub mod routes;

use crate::config::{AppConfig, Environment};
use crate::data::{DataError, DataStore, SpecsTable};

const MAX_REQUEST_BYTES: usize = 1 << 20;

/// Read-only data every request is served from.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub store: DataStore,
    pub specs: SpecsTable,
    pub environment: Environment,
}

impl AppState {
    pub fn new(store: DataStore, specs: SpecsTable, environment: Environment) -> Self {
        Self {
            store,
            specs,
            environment,
        }
    }

    pub fn load(config: &AppConfig) -> Result<Self, DataError> {
        let store = DataStore::load(config.operators_path())?;
        let specs = SpecsTable::load(config.specs_path())?;
        Ok(Self::new(store, specs, config.environment))
    }
}

pub fn run_server(bind_addr: &str, state: &AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    tracing::info!("myrtle server listening on http://{bind_addr}");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream, state) {
                    tracing::warn!("request error: {err}");
                }
            }
            Err(err) => tracing::warn!("connection failed: {err}"),
        }
    }

    Ok(())
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Reads one request: headers, then as much body as `Content-Length` asks for.
fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 16_384];
    loop {
        let bytes_read = stream.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        request.extend_from_slice(&buffer[..bytes_read]);

        let text = String::from_utf8_lossy(&request);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let expected = head_end + 4 + content_length(&text[..head_end]);
            if request.len() >= expected {
                break;
            }
        }
        if request.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }
    Ok(request)
}

fn handle_connection(stream: &mut TcpStream, state: &AppState) -> std::io::Result<()> {
    let raw = read_request(stream)?;
    if raw.is_empty() {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&raw);
    let mut lines = request.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut request_parts = request_line.split_whitespace();
    let method = request_parts.next().unwrap_or("GET");
    let path = request_parts.next().unwrap_or("/");

    let body = request
        .split("\r\n\r\n")
        .nth(1)
        .or_else(|| request.split("\n\n").nth(1))
        .unwrap_or("");

    let response = routes::route_request(state, method, path, body);
    tracing::info!("{method} {path} -> {}", response.status_code);
    stream.write_all(response.to_http_string().as_bytes())?;
    stream.flush()?;
    Ok(())
}
