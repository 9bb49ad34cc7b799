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
//! Packet ingest from pcap captures: slices link/IP/transport headers out of raw pcap
//! records and converts them into `(FlowKey, Packet)` tuples, in host byte order, for
//! `TimeAnalyzer::add`. IPv6 and non-TCP/UDP transport slices are skipped (non-goals).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use etherparse::{InternetSlice, SlicedPacket, TransportSlice};
use flate2::bufread::GzDecoder;
use pcap_file::pcap::PcapReader;

use crate::packet::{FlowKey, Packet};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pcap error: {0}")]
    Pcap(#[from] pcap_file::PcapError),
}

/// Iterates `(FlowKey, Packet)` tuples out of a pcap capture, gzip-compressed or not
/// (selected by the `.gz` file extension).
pub struct PcapIngest {
    reader: PcapReader<Box<dyn Read>>,
}

impl PcapIngest {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        let inner: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(PcapIngest {
            reader: PcapReader::new(inner)?,
        })
    }
}

impl Iterator for PcapIngest {
    type Item = Result<(FlowKey, Packet), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.reader.next_packet()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };

            let Ok(sliced) = SlicedPacket::from_ethernet(&record.data) else {
                continue;
            };
            let Some(InternetSlice::Ipv4(ip)) = sliced.net else {
                continue;
            };
            let header = ip.header();
            let saddr = u32::from(header.source_addr());
            let daddr = u32::from(header.destination_addr());
            let len = header.total_len();
            let proto: u8 = header.protocol().into();

            let (sport, dport, tcpflags) = match sliced.transport {
                Some(TransportSlice::Tcp(tcp)) => (
                    tcp.source_port(),
                    tcp.destination_port(),
                    tcp_flags(&tcp),
                ),
                Some(TransportSlice::Udp(udp)) => (udp.source_port(), udp.destination_port(), 0),
                _ => continue,
            };

            let time = record.timestamp.as_secs_f64();
            let key = FlowKey::new(saddr, daddr);
            let pkt = Packet {
                time,
                sport,
                dport,
                proto,
                len,
                tcpflags,
            };
            return Some(Ok((key, pkt)));
        }
    }
}

/// Packs the standard TCP control bits into a single byte, CWR..FIN high-to-low, matching
/// the wire layout of the flags octet.
fn tcp_flags(tcp: &etherparse::TcpSlice<'_>) -> u8 {
    (tcp.cwr() as u8) << 7
        | (tcp.ece() as u8) << 6
        | (tcp.urg() as u8) << 5
        | (tcp.ack() as u8) << 4
        | (tcp.psh() as u8) << 3
        | (tcp.rst() as u8) << 2
        | (tcp.syn() as u8) << 1
        | (tcp.fin() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal 20-byte TCP header (no options) with the given flags octet.
    fn header_with_flags(flags: u8) -> [u8; 20] {
        let mut buf = [0u8; 20];
        buf[0..2].copy_from_slice(&1234u16.to_be_bytes()); // source port
        buf[2..4].copy_from_slice(&80u16.to_be_bytes()); // destination port
        buf[12] = 5 << 4; // data offset: 5 words, no options, reserved bits zero
        buf[13] = flags;
        buf[14..16].copy_from_slice(&0xffffu16.to_be_bytes()); // window size
        buf
    }

    #[test]
    fn no_flags_set() {
        let buf = header_with_flags(0x00);
        let tcp = etherparse::TcpSlice::from_slice(&buf).unwrap();
        assert_eq!(tcp_flags(&tcp), 0x00);
    }

    #[test]
    fn syn_only() {
        let buf = header_with_flags(0x02);
        let tcp = etherparse::TcpSlice::from_slice(&buf).unwrap();
        assert_eq!(tcp_flags(&tcp), 0x02);
    }

    #[test]
    fn syn_ack() {
        let buf = header_with_flags(0x12);
        let tcp = etherparse::TcpSlice::from_slice(&buf).unwrap();
        assert_eq!(tcp_flags(&tcp), 0x12);
    }

    #[test]
    fn all_flags_set() {
        let buf = header_with_flags(0xff);
        let tcp = etherparse::TcpSlice::from_slice(&buf).unwrap();
        assert_eq!(tcp_flags(&tcp), 0xff);
    }
}
