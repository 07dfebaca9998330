use std::path::Path;

/// Writes a mono 44.1 kHz sine wave with the given number of samples.
pub fn write_wav(path: &Path, samples: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..samples {
        let t = i as f32 / 44100.0;
        let sample = (t * 440.0 * std::f32::consts::TAU).sin() * i16::MAX as f32 * 0.2;
        writer.write_sample(sample as i16).unwrap();
    }
    writer.finalize().unwrap();
}
