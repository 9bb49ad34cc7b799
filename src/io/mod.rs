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
//! Host collaborators that sit outside the statistical core: pcap ingest and CSV
//! input/output. None of this module influences the core's semantics; it only turns
//! bytes on disk into `(FlowKey, Packet)` tuples and back.

pub mod csv_io;
pub mod pcap;

use std::path::Path;

use crate::time_analyzer::TimeAnalyzer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Pcap(#[from] pcap::Error),
    #[error(transparent)]
    Csv(#[from] csv_io::Error),
}

/// Ingests a trace file into `analyzer`, dispatching on file extension: `.csv` is read
/// via [`csv_io::TraceReader`], anything else is treated as a pcap capture (optionally
/// `.gz`-compressed) via [`pcap::PcapIngest`]. Shared by the `fit` and `synth` binaries
/// so both ingest identically from the same observed trace.
pub fn load_trace(path: impl AsRef<Path>, analyzer: &mut TimeAnalyzer) -> Result<(), Error> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == "csv") {
        for row in csv_io::TraceReader::open(path)?.records() {
            let (key, pkt) = row?;
            analyzer.add(key, pkt);
        }
    } else {
        for row in pcap::PcapIngest::open(path)? {
            let (key, pkt) = row?;
            analyzer.add(key, pkt);
        }
    }
    Ok(())
}
