//! Decoded replay loading for the bench runner.
//!
//! A decoded replay is a JSON-lines file: the first non-blank line is the
//! `MatchHeader`, every following line one `ReplayEvent` tagged by `"kind"`.

use anyhow::{bail, Context, Result};
use replay_core::{EventSource, MatchHeader, ReplayEvent};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Checks the header before any event is read.
pub fn validate_header(header: &MatchHeader) -> Result<()> {
    if header.map_size == 0 {
        bail!("map_size must be > 0");
    }
    let mut seen = HashSet::new();
    for player in &header.players {
        if player.id.0 == 0 {
            bail!("player id 0 is reserved for gaia");
        }
        if !seen.insert(player.id) {
            bail!("player id {} appears more than once in the header", player.id);
        }
    }
    Ok(())
}

/// Streams events from a JSON-lines reader.
///
/// Lines that do not decode are skipped with a warning and counted; a read
/// error ends the match.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    header: MatchHeader,
    label: String,
    line_number: usize,
    skipped_lines: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Read and validate the header line. `label` names the input in logs.
    pub fn from_reader(mut reader: R, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let mut buf = String::new();
        let mut line_number = 0;
        loop {
            buf.clear();
            let read = reader
                .read_line(&mut buf)
                .with_context(|| format!("reading header of {label}"))?;
            if read == 0 {
                bail!("{label} is empty: no header line");
            }
            line_number += 1;
            if !buf.trim().is_empty() {
                break;
            }
        }
        let header: MatchHeader = serde_json::from_str(buf.trim())
            .with_context(|| format!("parsing header of {label} (line {line_number})"))?;
        validate_header(&header).with_context(|| format!("invalid header in {label}"))?;
        Ok(Self {
            reader,
            header,
            label,
            line_number,
            skipped_lines: 0,
            buf,
        })
    }

    /// Event lines dropped because they did not decode.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    type Error = std::io::Error;

    fn header(&self) -> &MatchHeader {
        &self.header
    }

    fn next_event(&mut self) -> Result<Option<ReplayEvent>, Self::Error> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ReplayEvent>(line) {
                Ok(event) => return Ok(Some(event)),
                Err(err) => {
                    tracing::warn!(
                        replay = %self.label,
                        line = self.line_number,
                        error = %err,
                        "skipping malformed event line"
                    );
                    self.skipped_lines += 1;
                }
            }
        }
    }
}

pub fn open_replay(path: &Path) -> Result<JsonLinesSource<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    JsonLinesSource::from_reader(BufReader::new(file), path.display().to_string())
}

/// Write a header and events in the format `JsonLinesSource` reads.
pub fn write_replay<'a, W: Write>(
    mut writer: W,
    header: &MatchHeader,
    events: impl IntoIterator<Item = &'a ReplayEvent>,
) -> Result<()> {
    serde_json::to_writer(&mut writer, header).context("serializing header")?;
    writeln!(writer)?;
    for event in events {
        serde_json::to_writer(&mut writer, event).context("serializing event")?;
        writeln!(writer)?;
    }
    writer.flush().context("flushing replay writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_core::{PlayerId, PlayerInfo};
    use std::io::Cursor;

    fn source(text: &str) -> Result<JsonLinesSource<Cursor<Vec<u8>>>> {
        JsonLinesSource::from_reader(Cursor::new(text.as_bytes().to_vec()), "inline")
    }

    fn drain<R: BufRead>(source: &mut JsonLinesSource<R>) -> Vec<ReplayEvent> {
        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_reads_header_and_events() {
        let mut src = source(
            "{\"map_size\":120,\"players\":[{\"id\":1}]}\n\
             {\"kind\":\"unit_queued\",\"player\":1,\"unit_id\":83}\n\
             {\"kind\":\"time_advance\",\"delta_ms\":500}\n",
        )
        .unwrap();
        assert_eq!(src.header().map_size, 120);
        assert_eq!(src.header().players[0].id, PlayerId(1));
        let events = drain(&mut src);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ReplayEvent::TimeAdvance { delta_ms: 500 });
    }

    #[test]
    fn test_blank_and_malformed_lines_skipped() {
        let mut src = source(
            "\n{\"map_size\":120}\n\
             \n\
             not json\n\
             {\"kind\":\"unit_queued\",\"player\":1}\n\
             {\"kind\":\"flare\",\"player\":1}\n\
             {\"kind\":\"resign\",\"player\":2}\n",
        )
        .unwrap();
        let events = drain(&mut src);
        assert_eq!(
            events,
            vec![
                ReplayEvent::Unknown,
                ReplayEvent::Resign {
                    player: PlayerId(2)
                }
            ]
        );
        assert_eq!(src.skipped_lines(), 2);
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = source("\n\n").unwrap_err();
        assert!(err.to_string().contains("no header line"));
    }

    #[test]
    fn test_header_validation() {
        assert!(source("{\"map_size\":0}\n").is_err());
        assert!(source("{\"map_size\":10,\"players\":[{\"id\":0}]}\n").is_err());
        assert!(source("{\"map_size\":10,\"players\":[{\"id\":2},{\"id\":2}]}\n").is_err());

        let header = MatchHeader {
            map_size: 10,
            players: vec![PlayerInfo {
                id: PlayerId(3),
                name: None,
                objects: Vec::new(),
            }],
        };
        assert!(validate_header(&header).is_ok());
    }
}
