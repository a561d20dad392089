#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scour::search::MatchScanner;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    term: &'a str,
    text: &'a str,
    case_sensitive: bool,
    max_line_length: u8,
}

fuzz_target!(|input: Input<'_>| {
    // Scanning must never panic, and every span and window must land on
    // character boundaries of the line it came from
    let Ok(scanner) = MatchScanner::literal(input.term, input.case_sensitive, input.max_line_length as usize) else {
        return;
    };
    for m in scanner.scan(input.text) {
        assert!(m.display_text.chars().count() <= (input.max_line_length as usize).max(1));
        for span in m.visible_spans() {
            let _ = &m.display_text[span.start..span.end];
        }
    }
});
