//! Framing of the Azure Speech synthesis websocket.
//!
//! Text frames are an HTTP-like header block (`Name:value` lines), a blank line, and
//! a body. Binary frames start with a big-endian `u16` header length, followed by
//! that many bytes of headers and then the payload. One synthesis is one "turn":
//! `turn.start`, any number of `audio.metadata` text frames and `audio` binary
//! frames, then `turn.end`.

use serde::Deserialize;

use crate::error::{Result, VoiceoverError};
use crate::record::{BoundaryType, WordBoundary};

/// Azure reports offsets and durations in 100 ns ticks.
const TICKS_PER_MS: u64 = 10_000;

fn protocol_error(details: impl Into<String>) -> VoiceoverError {
    VoiceoverError::Synthesis {
        reason: "Unexpected message from Azure Speech".to_string(),
        details: Some(details.into()),
    }
}

/// Value of header `name` (case-insensitive) in a `\r\n`-separated header block.
fn header<'a>(block: &'a str, name: &str) -> Option<&'a str> {
    block.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

/// A text frame sent by the service.
#[derive(Debug, PartialEq)]
pub enum ServiceMessage<'a> {
    TurnStart,
    Response,
    Metadata(Vec<WordBoundary>),
    TurnEnd,
    Other(&'a str),
}

impl<'a> ServiceMessage<'a> {
    pub fn parse(frame: &'a str) -> Result<Self> {
        let (headers, body) = frame.split_once("\r\n\r\n").unwrap_or((frame, ""));
        let path = header(headers, "Path")
            .ok_or_else(|| protocol_error("text frame without a Path header"))?;

        Ok(match path {
            "turn.start" => Self::TurnStart,
            "response" => Self::Response,
            "audio.metadata" => Self::Metadata(parse_metadata(body)?),
            "turn.end" => Self::TurnEnd,
            other => Self::Other(other),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataFrame {
    #[serde(default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataEntry {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(default)]
    data: Option<MetadataData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataData {
    offset: u64,
    #[serde(default)]
    duration: u64,
    #[serde(rename = "text", default)]
    text: Option<MetadataText>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataText {
    #[serde(default)]
    text: String,
    #[serde(default)]
    length: u32,
    #[serde(default)]
    text_offset: u32,
    #[serde(default)]
    boundary_type: Option<String>,
}

/// Word boundaries in an `audio.metadata` body, in emission order, offsets in ms.
///
/// Entries that are not boundaries (visemes, session end) are skipped.
pub fn parse_metadata(body: &str) -> Result<Vec<WordBoundary>> {
    let frame: MetadataFrame = serde_json::from_str(body)
        .map_err(|e| protocol_error(format!("malformed audio.metadata: {e}")))?;

    Ok(frame
        .metadata
        .into_iter()
        .filter(|entry| entry.kind == "WordBoundary" || entry.kind == "SentenceBoundary")
        .filter_map(|entry| {
            let data = entry.data?;
            let text = data.text.unwrap_or_default();
            let kind = text.boundary_type.as_deref().unwrap_or(entry.kind.as_str());
            let boundary_type = match kind {
                "PunctuationBoundary" => BoundaryType::Punctuation,
                "SentenceBoundary" => BoundaryType::Sentence,
                _ => BoundaryType::Word,
            };
            Some(WordBoundary {
                boundary_type,
                audio_offset: (data.offset / TICKS_PER_MS) as i64,
                duration_ms: data.duration / TICKS_PER_MS,
                text: text.text,
                text_offset: text.text_offset,
                word_length: text.length,
            })
        })
        .collect())
}

/// Audio payload of a binary frame, or `None` when the frame carries something else.
pub fn audio_payload(frame: &[u8]) -> Result<Option<&[u8]>> {
    if frame.len() < 2 {
        return Err(protocol_error("binary frame shorter than its length prefix"));
    }
    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let body_start = 2 + header_len;
    if frame.len() < body_start {
        return Err(protocol_error(format!(
            "binary frame header truncated (need {body_start} bytes, got {})",
            frame.len()
        )));
    }

    let headers = String::from_utf8_lossy(&frame[2..body_start]);
    match header(&headers, "Path") {
        Some("audio") => Ok(Some(&frame[body_start..])),
        _ => Ok(None),
    }
}

/// The `speech.config` frame that opens a connection.
pub fn speech_config_message(output_format: &str, timestamp: &str) -> String {
    let config = serde_json::json!({
        "context": {
            "synthesis": {
                "audio": {
                    "metadataOptions": {
                        "sentenceBoundaryEnabled": false,
                        "wordBoundaryEnabled": true
                    },
                    "outputFormat": output_format
                }
            }
        }
    });
    format!(
        "X-Timestamp:{timestamp}\r\nContent-Type:application/json; charset=utf-8\r\n\
         Path:speech.config\r\n\r\n{config}"
    )
}

/// The `ssml` frame that requests one synthesis.
pub fn ssml_message(request_id: &str, ssml: &str, timestamp: &str) -> String {
    format!(
        "X-RequestId:{request_id}\r\nContent-Type:application/ssml+xml\r\n\
         X-Timestamp:{timestamp}\r\nPath:ssml\r\n\r\n{ssml}"
    )
}

/// Accumulates one turn's audio and boundaries until `turn.end`.
#[derive(Debug, Default)]
pub struct TurnCollector {
    audio: Vec<u8>,
    boundaries: Vec<WordBoundary>,
    finished: bool,
}

impl TurnCollector {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn handle_text(&mut self, frame: &str) -> Result<()> {
        match ServiceMessage::parse(frame)? {
            ServiceMessage::Metadata(boundaries) => self.boundaries.extend(boundaries),
            ServiceMessage::TurnEnd => self.finished = true,
            ServiceMessage::Other(path) => log::debug!("Ignoring Azure Speech frame {path}"),
            ServiceMessage::TurnStart | ServiceMessage::Response => {}
        }
        Ok(())
    }

    pub fn handle_binary(&mut self, frame: &[u8]) -> Result<()> {
        if let Some(audio) = audio_payload(frame)? {
            self.audio.extend_from_slice(audio);
        }
        Ok(())
    }

    /// The collected audio and boundaries of a completed turn.
    pub fn finish(self) -> Result<(Vec<u8>, Vec<WordBoundary>)> {
        if !self.finished {
            return Err(protocol_error("connection ended before turn.end"));
        }
        if self.audio.is_empty() {
            return Err(VoiceoverError::Synthesis {
                reason: "Azure Speech returned no audio".to_string(),
                details: None,
            });
        }
        Ok((self.audio, self.boundaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA_FRAME: &str = "X-RequestId:5f2c\r\nContent-Type:application/json; charset=utf-8\r\n\
        Path:audio.metadata\r\n\r\n\
        {\"Metadata\":[\
        {\"Type\":\"WordBoundary\",\"Data\":{\"Offset\":10000000,\"Duration\":3250000,\
          \"text\":{\"Text\":\"Hello\",\"Length\":5,\"BoundaryType\":\"WordBoundary\"}}},\
        {\"Type\":\"WordBoundary\",\"Data\":{\"Offset\":13250000,\"Duration\":500000,\
          \"text\":{\"Text\":\",\",\"Length\":1,\"BoundaryType\":\"PunctuationBoundary\"}}},\
        {\"Type\":\"WordBoundary\",\"Data\":{\"Offset\":15123456,\"Duration\":4000000,\
          \"text\":{\"Text\":\"world\",\"Length\":5,\"BoundaryType\":\"WordBoundary\"}}},\
        {\"Type\":\"SessionEnd\",\"Data\":{\"Offset\":20000000}}]}";

    fn binary_frame(path: &str, payload: &[u8]) -> Vec<u8> {
        let headers = format!("X-RequestId:5f2c\r\nContent-Type:audio/mpeg\r\nPath:{path}\r\n");
        let mut frame = (headers.len() as u16).to_be_bytes().to_vec();
        frame.extend_from_slice(headers.as_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn metadata_frame_yields_ordered_boundaries_in_ms() {
        let ServiceMessage::Metadata(boundaries) = ServiceMessage::parse(METADATA_FRAME).unwrap()
        else {
            panic!("expected metadata");
        };

        let summary: Vec<(&str, i64, u64, BoundaryType)> = boundaries
            .iter()
            .map(|b| (b.text.as_str(), b.audio_offset, b.duration_ms, b.boundary_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Hello", 1000, 325, BoundaryType::Word),
                (",", 1325, 50, BoundaryType::Punctuation),
                ("world", 1512, 400, BoundaryType::Word),
            ]
        );
        assert_eq!(boundaries[0].word_length, 5);
    }

    #[test]
    fn parses_turn_control_frames() {
        assert_eq!(
            ServiceMessage::parse("X-RequestId:1\r\nPath:turn.start\r\n\r\n{}").unwrap(),
            ServiceMessage::TurnStart
        );
        assert_eq!(
            ServiceMessage::parse("path: turn.end\r\n\r\n").unwrap(),
            ServiceMessage::TurnEnd
        );
        assert!(ServiceMessage::parse("X-RequestId:1\r\n\r\n{}").is_err());
    }

    #[test]
    fn extracts_audio_from_binary_frames() {
        let frame = binary_frame("audio", b"ID3 chunk");
        assert_eq!(audio_payload(&frame).unwrap(), Some(&b"ID3 chunk"[..]));

        let other = binary_frame("something.else", b"xx");
        assert_eq!(audio_payload(&other).unwrap(), None);

        assert!(audio_payload(&[0]).is_err());
        assert!(audio_payload(&[0, 40, b'P']).is_err());
    }

    #[test]
    fn collects_a_complete_turn() {
        let mut turn = TurnCollector::default();
        turn.handle_text("Path:turn.start\r\n\r\n{}").unwrap();
        turn.handle_binary(&binary_frame("audio", b"ID3 ")).unwrap();
        turn.handle_text(METADATA_FRAME).unwrap();
        turn.handle_binary(&binary_frame("audio", b"rest")).unwrap();
        assert!(!turn.is_finished());
        turn.handle_text("Path:turn.end\r\n\r\n").unwrap();
        assert!(turn.is_finished());

        let (audio, boundaries) = turn.finish().unwrap();
        assert_eq!(audio, b"ID3 rest");
        assert_eq!(boundaries.len(), 3);
    }

    #[test]
    fn turn_without_audio_is_a_synthesis_error() {
        let mut turn = TurnCollector::default();
        turn.handle_text("Path:turn.end\r\n\r\n").unwrap();
        assert!(matches!(
            turn.finish(),
            Err(VoiceoverError::Synthesis { .. })
        ));

        let unfinished = TurnCollector::default();
        assert!(unfinished.finish().is_err());
    }

    #[test]
    fn speech_config_requests_word_boundaries() {
        let message = speech_config_message("audio-48khz-192kbitrate-mono-mp3", "2026-10-18T00:00:00.000Z");
        let (headers, body) = message.split_once("\r\n\r\n").unwrap();
        assert_eq!(header(headers, "Path"), Some("speech.config"));

        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        let audio = &json["context"]["synthesis"]["audio"];
        assert_eq!(audio["metadataOptions"]["wordBoundaryEnabled"], true);
        assert_eq!(audio["outputFormat"], "audio-48khz-192kbitrate-mono-mp3");
    }

    #[test]
    fn ssml_message_carries_markup_body() {
        let message = ssml_message("abc", "<speak/>", "ts");
        let (headers, body) = message.split_once("\r\n\r\n").unwrap();
        assert_eq!(header(headers, "X-RequestId"), Some("abc"));
        assert_eq!(header(headers, "Path"), Some("ssml"));
        assert_eq!(body, "<speak/>");
    }
}
