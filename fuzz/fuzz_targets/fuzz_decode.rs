#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding and tokenizing arbitrary bytes should not panic
    let encodings = [encoding_rs::UTF_8, encoding_rs::UTF_16LE, encoding_rs::SHIFT_JIS];
    if let Some(decoded) = scour::utils::decode_strict(data, &encodings) {
        let _ = scour::utils::is_binary(&decoded.text);
        let counts = scour::utils::count_tokens(&decoded.text);
        assert!(counts.counts.len() <= counts.total as usize);
    }
});
