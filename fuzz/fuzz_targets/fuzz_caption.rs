#![no_main]

use libfuzzer_sys::fuzz_target;

use captioner::caption::{AfterRule, CaptionConfig, CaptionTransformer, Marker, Mode};

fuzz_target!(|data: &[u8]| {
    // Arbitrary captions through every mode; none may panic
    let raw = String::from_utf8_lossy(data);

    let modes = [
        Mode::PlainPrefix {
            template: "{numbering} {caption}".into(),
            clean: true,
        },
        Mode::SingleField,
        Mode::TwoFieldSplit {
            delimiter: "//".into(),
            after: AfterRule {
                truncate_at: Some("Batch".into()),
                clean: true,
            },
        },
        Mode::SuffixAnchored {
            keyword: "Class Date".into(),
            stylize_suffix: true,
            stylize_fallback: true,
        },
        Mode::MarkerSpan {
            start: Marker::ignore_case(":").nth(2),
            end: Some(Marker::ignore_case(".mkv")),
            heading: None,
            require_end: false,
            truncate_first: false,
            clean: true,
        },
        Mode::MarkerSpan {
            start: Marker::literal(":").nth(2),
            end: Some(Marker::literal("—")),
            heading: None,
            require_end: false,
            truncate_first: true,
            clean: false,
        },
        Mode::Scrub,
    ];

    for mode in modes {
        let mut config = CaptionConfig::with_mode(mode);
        config.cleaning.unwanted_phrases = vec!["VIDEO".into(), "𝖢𝗅𝖺𝗌𝗌 𝖣𝖺𝗍𝖾 »".into()];
        config.cleaning.strip_bracketed = true;
        let transformer = CaptionTransformer::new(config).unwrap();
        let _ = transformer.transform_sequence(&raw, data.len() as u64 + 1);
    }
});
