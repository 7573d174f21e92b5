use crawl_refinery::refinery::{chunk_markdown, clean_markdown, estimate_tokens, ChunkerConfig, HeadingChunker};
use proptest::prelude::*;

// * Test Suite for the cleaner and chunker working together

const PAGE: &str = "\
[Skip to content](#main)
# Navigation
- [Home](/)
- [Blog](/blog)

# Field Guide

Birds are best observed in the early morning when they are most active and vocal.


## Equipment
Binoculars with 8x magnification are a good compromise between detail and stability.
Accept Cookies

## Footer
© 2024 Field Guides Ltd. All rights reserved.
[Privacy Policy](/privacy)
";

#[test]
fn test_clean_then_chunk() {
    let cleaned = clean_markdown(PAGE);

    assert!(!cleaned.text.contains("Skip to content"));
    assert!(!cleaned.text.contains("[Blog]"));
    assert!(!cleaned.text.contains("Accept Cookies"));
    assert!(!cleaned.text.contains("©"));
    assert!(!cleaned.text.contains("\n\n\n"));
    assert!(cleaned.text.starts_with("# Field Guide"));
    assert!(cleaned.is_sufficient());

    let chunks = chunk_markdown(&cleaned.text, "https://birds.example.com/guide", "Field Guide");
    let headings: Vec<_> = chunks.iter().map(|c| c.section_heading.as_str()).collect();
    assert_eq!(headings, vec!["Field Guide", "Equipment"]);

    for chunk in &chunks {
        assert_eq!(chunk.token_estimate, chunk.text.chars().count() / 4);
        assert_eq!(chunk.text, chunk.text.trim());
    }
}

#[test]
fn test_chunker_respects_custom_budget() {
    let chunker = HeadingChunker::with_config(ChunkerConfig::new(50, 60, 5));
    let body = (0..10)
        .map(|i| format!("Paragraph {} {}", i, "lorem ipsum dolor sit amet ".repeat(4)))
        .collect::<Vec<_>>()
        .join("\n\n");
    let markdown = format!("## Notes\n{}", body);

    let chunks = chunker.chunk(&markdown, "https://example.com/notes", "Notes");
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.section_heading == "Notes"));

    // * Every packed buffer stays near the target: at most one paragraph past it plus the overlap seed
    let paragraph_tokens = estimate_tokens("Paragraph 0 ") + estimate_tokens(&"lorem ipsum dolor sit amet ".repeat(4));
    for chunk in &chunks {
        assert!(chunk.token_estimate <= 50 + paragraph_tokens + 5 + 1);
    }
}

#[test]
fn test_indented_footer_is_stable_across_passes() {
    let once = clean_markdown("  ## Footer\n[About](/about)\n[Jobs](/jobs)").text;
    let twice = clean_markdown(&once).text;
    assert_eq!(once, twice);
    assert!(once.is_empty());
}

fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        Just("# Title".to_string()),
        Just("## Menu".to_string()),
        Just("### Sidebar".to_string()),
        Just("## Details".to_string()),
        Just("#### Minor".to_string()),
        Just("  ## Footer".to_string()),
        Just("  ## Details".to_string()),
        Just("\t# Navigation".to_string()),
        "  [a-z ]{1,20}[a-z.]",
        Just("© 2023 Example".to_string()),
        Just("Back to top".to_string()),
        Just("Follow us on Mastodon".to_string()),
        "[a-z ]{1,30}[a-z.]",
    ]
}

proptest! {
    #[test]
    fn cleaning_is_idempotent(lines in prop::collection::vec(line_strategy(), 0..40)) {
        let markdown = lines.join("\n");
        let once = clean_markdown(&markdown).text;
        let twice = clean_markdown(&once).text;
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn chunks_are_ordered_and_trimmed(lines in prop::collection::vec(line_strategy(), 0..60)) {
        let cleaned = clean_markdown(&lines.join("\n"));
        let chunks = chunk_markdown(&cleaned.text, "https://example.com/p", "Page");

        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.chunk_index, i);
            prop_assert!(!chunk.text.is_empty());
            prop_assert_eq!(chunk.text.trim(), chunk.text.as_str());
            prop_assert_eq!(chunk.token_estimate, chunk.text.chars().count() / 4);
        }
    }
}
