//! Connection Handler
//!
//! Runs one client session: read a line, parse, dispatch, respond, repeat.
//! Commands on a connection are strictly sequential; the next line is not
//! read until the previous response has been flushed.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{encode_response, parse_command, Command, Response, MAX_LINE_LEN};

enum ReadOutcome {
    /// Peer closed the connection
    Eof,
    /// One decoded request line
    Line(String),
    /// Line exceeded the cap; buffer state is unrecoverable
    TooLong,
    /// Bytes were not valid UTF-8
    BadEncoding,
}

/// Handles a single client connection
pub struct Connection {
    reader: BufReader<TcpStream>,
    engine: Arc<Engine>,
    peer_addr: String,
}

impl Connection {
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Self {
            reader: BufReader::new(stream),
            engine,
            peer_addr,
        })
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Serve the session until QUIT, EOF, an I/O error, or a framing error.
    pub fn handle(&mut self) -> Result<()> {
        loop {
            let line = match self.read_line()? {
                ReadOutcome::Eof => return Ok(()),
                ReadOutcome::TooLong => {
                    self.write_response(&Response::error("line too long"))?;
                    return Ok(());
                }
                ReadOutcome::BadEncoding => {
                    self.write_response(&Response::error("invalid encoding"))?;
                    return Ok(());
                }
                ReadOutcome::Line(line) => line,
            };

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(response) => {
                    // Malformed input keeps the session open
                    self.write_response(&response)?;
                    continue;
                }
            };

            if matches!(command, Command::Quit) {
                self.write_response(&Response::bye())?;
                return Ok(());
            }

            let response = self.engine.execute(command);
            self.write_response(&response)?;
        }
    }

    /// Read one `\n`-terminated line, bounded at `MAX_LINE_LEN` bytes.
    fn read_line(&mut self) -> Result<ReadOutcome> {
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(MAX_LINE_LEN as u64 + 1)
            .read_until(b'\n', &mut buf)?;

        if n == 0 {
            return Ok(ReadOutcome::Eof);
        }
        if !buf.ends_with(b"\n") && buf.len() > MAX_LINE_LEN {
            return Ok(ReadOutcome::TooLong);
        }
        match String::from_utf8(buf) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(_) => Ok(ReadOutcome::BadEncoding),
        }
    }

    fn write_response(&mut self, response: &Response) -> Result<()> {
        let line = encode_response(response);
        let stream = self.reader.get_mut();
        stream.write_all(line.as_bytes())?;
        stream.flush()?;
        Ok(())
    }
}
