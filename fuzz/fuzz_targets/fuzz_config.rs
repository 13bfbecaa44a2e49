#![no_main]

use libfuzzer_sys::fuzz_target;

use captioner::caption::CaptionTransformer;
use captioner::dispatch::PipelineConfig;

fuzz_target!(|data: &[u8]| {
    // Rule files are operator input; parsing and validation must return
    // errors, not panic
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = PipelineConfig::from_toml_str(text) {
        if let Ok(transformer) = CaptionTransformer::new(config.caption) {
            let _ = transformer.transform_sequence("Topic // detail Batch 1", 1);
        }
    }
});
