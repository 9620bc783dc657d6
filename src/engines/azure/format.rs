use crate::error::{Result, VoiceoverError};

/// SDK-style MP3 format names and the matching `X-Microsoft-OutputFormat` values.
const MP3_FORMATS: &[(&str, &str)] = &[
    ("Audio16Khz32KBitRateMonoMp3", "audio-16khz-32kbitrate-mono-mp3"),
    ("Audio16Khz64KBitRateMonoMp3", "audio-16khz-64kbitrate-mono-mp3"),
    ("Audio16Khz128KBitRateMonoMp3", "audio-16khz-128kbitrate-mono-mp3"),
    ("Audio24Khz48KBitRateMonoMp3", "audio-24khz-48kbitrate-mono-mp3"),
    ("Audio24Khz96KBitRateMonoMp3", "audio-24khz-96kbitrate-mono-mp3"),
    ("Audio24Khz160KBitRateMonoMp3", "audio-24khz-160kbitrate-mono-mp3"),
    ("Audio48Khz96KBitRateMonoMp3", "audio-48khz-96kbitrate-mono-mp3"),
    ("Audio48Khz192KBitRateMonoMp3", "audio-48khz-192kbitrate-mono-mp3"),
];

/// Map an SDK-style format name (e.g. `Audio48Khz192KBitRateMonoMp3`) to the value
/// the REST endpoint expects.
pub fn rest_output_format(name: &str) -> Result<&'static str> {
    MP3_FORMATS
        .iter()
        .find(|(sdk, _)| *sdk == name)
        .map(|(_, rest)| *rest)
        .ok_or_else(|| VoiceoverError::UnsupportedFormat(name.to_string()))
}
