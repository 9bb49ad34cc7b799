// burstify: synthesizes network packet traces matching observed time- and address-space statistics
// Copyright (C) 2026 burstify contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! CSV input/output for `(FlowKey, Packet)` streams: lets a workflow dump an observed or
//! synthesized trace to disk, or re-ingest one, without going through pcap.

use std::io::{Read, Write};
use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::packet::{FlowKey, Packet};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the trace CSV: addresses rendered dotted-quad, everything else as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Row {
    time: f64,
    saddr: Ipv4Addr,
    daddr: Ipv4Addr,
    sport: u16,
    dport: u16,
    proto: u8,
    len: u16,
    tcpflags: u8,
}

impl From<(FlowKey, Packet)> for Row {
    fn from((key, pkt): (FlowKey, Packet)) -> Self {
        Row {
            time: pkt.time,
            saddr: Ipv4Addr::from(key.saddr),
            daddr: Ipv4Addr::from(key.daddr),
            sport: pkt.sport,
            dport: pkt.dport,
            proto: pkt.proto,
            len: pkt.len,
            tcpflags: pkt.tcpflags,
        }
    }
}

impl From<Row> for (FlowKey, Packet) {
    fn from(row: Row) -> Self {
        (
            FlowKey::new(row.saddr.into(), row.daddr.into()),
            Packet {
                time: row.time,
                sport: row.sport,
                dport: row.dport,
                proto: row.proto,
                len: row.len,
                tcpflags: row.tcpflags,
            },
        )
    }
}

/// Wraps a `csv::Writer` to stream emitted `(FlowKey, Packet)` tuples to disk, one row at
/// a time, with header `time,saddr,daddr,sport,dport,proto,len,tcpflags`.
pub struct TraceWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl TraceWriter<std::fs::File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(TraceWriter {
            inner: csv::WriterBuilder::new().has_headers(true).from_path(path)?,
        })
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn new(writer: W) -> Self {
        TraceWriter {
            inner: csv::WriterBuilder::new().has_headers(true).from_writer(writer),
        }
    }

    pub fn write(&mut self, key: FlowKey, pkt: Packet) -> Result<(), Error> {
        self.inner.serialize(Row::from((key, pkt)))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Reads a previously-dumped trace CSV back into `(FlowKey, Packet)` tuples, for
/// workflows that skip pcap ingest entirely.
pub struct TraceReader<R: Read> {
    inner: csv::Reader<R>,
}

impl TraceReader<std::fs::File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(TraceReader {
            inner: csv::ReaderBuilder::new().has_headers(true).from_path(path)?,
        })
    }
}

impl<R: Read> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        TraceReader {
            inner: csv::ReaderBuilder::new().has_headers(true).from_reader(reader),
        }
    }

    pub fn records(self) -> impl Iterator<Item = Result<(FlowKey, Packet), Error>> {
        self.inner.into_deserialize::<Row>().map(|r| match r {
            Ok(row) => Ok(row.into()),
            Err(e) => Err(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_csv_bytes() {
        let key = FlowKey::new(0x0A00_0001, 0x0A00_0002);
        let pkt = Packet {
            time: 1.25,
            sport: 1234,
            dport: 80,
            proto: 6,
            len: 60,
            tcpflags: 0x02,
        };

        let mut buf = Vec::new();
        {
            let mut w = TraceWriter::new(&mut buf);
            w.write(key, pkt).unwrap();
            w.flush().unwrap();
        }

        let reader = TraceReader::new(buf.as_slice());
        let rows: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, key);
        assert_eq!(rows[0].1, pkt);
    }
}
