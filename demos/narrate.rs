use std::time::Instant;

use voiceover_rs::{engines::azure::AzureStreamingEngine, SynthesisConfig, Synthesizer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let engine = AzureStreamingEngine::from_env()?;
    println!("Using Azure Speech in {}", engine.region());

    let config = SynthesisConfig::builder()
        .voice("en-US-AriaNeural")
        .global_speed(1.15)
        .output_dir("media/tts")
        .build()?;
    let mut synthesizer = Synthesizer::new(engine, config)?;

    let script = [
        "Welcome to this short introduction to   linear algebra.",
        "A vector is an ordered list of numbers.\nA matrix is a grid of them.",
        "Welcome to this short introduction to linear algebra.",
    ];

    for line in script {
        let start = Instant::now();
        let record = synthesizer.synthesize_from_text(line)?;
        println!(
            "{:.2?}  {} ({} word boundaries, adjusted: {})",
            start.elapsed(),
            record.final_audio_path.display(),
            record.word_boundaries.len(),
            record.is_speed_adjusted()
        );
    }

    Ok(())
}
