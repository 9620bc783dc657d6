use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::SynthesisConfig;
use crate::error::{Result, VoiceoverError};

/// Lowercase hex SHA-256 digest identifying one synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    ssml: &'a str,
    config: &'a SynthesisConfig,
}

/// Fingerprint the pair (markup, config).
///
/// The pair is encoded as JSON with object keys sorted at every level, so the digest
/// depends only on content, never on field or insertion order.
pub fn fingerprint(markup: &str, config: &SynthesisConfig) -> Result<Fingerprint> {
    // serde_json writes non-finite floats as `null`, which would alias distinct configs.
    if !config.global_speed.is_finite() {
        return Err(VoiceoverError::ConfigSerialization(format!(
            "global_speed {} has no stable encoding",
            config.global_speed
        )));
    }

    let value = serde_json::to_value(FingerprintInput {
        ssml: markup,
        config,
    })
    .map_err(|e| VoiceoverError::ConfigSerialization(e.to_string()))?;

    Ok(digest(&canonical_json(&value)))
}

fn digest(encoded: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    Fingerprint(format!("{:x}", hasher.finalize()))
}

/// Compact JSON with lexicographically sorted object keys.
fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    const SSML: &str = "<speak><voice name=\"en-US-AriaNeural\">Hello.</voice></speak>";

    #[test]
    fn is_stable_across_calls() {
        let config = SynthesisConfig::default();
        let a = fingerprint(SSML, &config).unwrap();
        let b = fingerprint(SSML, &config.clone()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn canonical_encoding_ignores_key_order() {
        let mut forward = serde_json::Map::new();
        forward.insert("voice".to_string(), json!("en-US-AriaNeural"));
        forward.insert("global_speed".to_string(), json!(1.5));
        forward.insert("nested".to_string(), json!({"b": 1, "a": [2, {"z": 0, "y": null}]}));

        let mut backward = serde_json::Map::new();
        backward.insert("nested".to_string(), json!({"a": [2, {"y": null, "z": 0}], "b": 1}));
        backward.insert("global_speed".to_string(), json!(1.5));
        backward.insert("voice".to_string(), json!("en-US-AriaNeural"));

        let forward = canonical_json(&Value::Object(forward));
        assert_eq!(forward, canonical_json(&Value::Object(backward)));
        assert_eq!(
            forward,
            r#"{"global_speed":1.5,"nested":{"a":[2,{"y":null,"z":0}],"b":1},"voice":"en-US-AriaNeural"}"#
        );
    }

    #[test]
    fn every_config_field_changes_the_fingerprint() {
        let base = SynthesisConfig::default();
        let base_fp = fingerprint(SSML, &base).unwrap();

        let variants = vec![
            SynthesisConfig {
                voice: "en-US-GuyNeural".to_string(),
                ..base.clone()
            },
            SynthesisConfig {
                style: Some("cheerful".to_string()),
                ..base.clone()
            },
            SynthesisConfig {
                language: "en-GB".to_string(),
                ..base.clone()
            },
            SynthesisConfig {
                output_format: "Audio24Khz96KBitRateMonoMp3".to_string(),
                ..base.clone()
            },
            SynthesisConfig {
                global_speed: 1.1,
                ..base.clone()
            },
            SynthesisConfig {
                output_dir: PathBuf::from("media/other"),
                ..base.clone()
            },
            SynthesisConfig {
                schema_version: base.schema_version + 1,
                ..base.clone()
            },
        ];

        for variant in variants {
            assert_ne!(fingerprint(SSML, &variant).unwrap(), base_fp, "{variant:?}");
        }
    }

    #[test]
    fn markup_changes_the_fingerprint() {
        let config = SynthesisConfig::default();
        assert_ne!(
            fingerprint(SSML, &config).unwrap(),
            fingerprint(&SSML.replace("Hello.", "Hello!"), &config).unwrap()
        );
    }

    #[test]
    fn non_finite_speed_cannot_be_fingerprinted() {
        let config = SynthesisConfig {
            global_speed: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            fingerprint(SSML, &config),
            Err(VoiceoverError::ConfigSerialization(_))
        ));
    }
}
