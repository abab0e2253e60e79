//! Extraction prompt.

use trendsage_core::Review;

use crate::types::ChatMessage;

const INSTRUCTIONS: &str = "You are an expert user researcher. Analyze the batch of app store reviews in the next message and pull out concrete issues, requests or feedback points.

For each review that contains a clear issue, bug report, feature request, or specific praise or complaint, write it as a short, concise topic phrase of 3-6 words.
Skip generic reviews such as \"Good\", \"Nice\" or \"Worst app\" unless they say why.";

const OUTPUT_FORMAT: &str = "Return the output as a JSON list of objects:
[
    { \"reviewId\": \"...\", \"topic\": \"...\" },
    ...
]
If a review has no specific content, leave it out of the list.";

/// Render the reviews worth sending, one `ID`/`Text` block each.
///
/// Reviews shorter than `min_chars` characters are dropped. Returns `None`
/// when nothing is left.
pub fn format_reviews(batch: &[Review], min_chars: usize) -> Option<String> {
    let mut text = String::new();
    for review in batch {
        if review.content.chars().count() < min_chars {
            continue;
        }
        text.push_str(&format!("ID: {}\nText: {}\n---\n", review.review_id, review.content));
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// System message (task and output format) followed by the reviews.
pub fn build_messages(reviews_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!("{}\n\n{}", INSTRUCTIONS, OUTPUT_FORMAT)),
        ChatMessage::user(format!("Reviews:\n{}", reviews_text)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_skips_short_reviews() {
        let batch = vec![
            Review::new("r1", "App crashes on login"),
            Review::new("r2", "ok"),
            Review::new("r3", "Good"),
        ];
        let text = format_reviews(&batch, 4).unwrap();
        assert_eq!(text, "ID: r1\nText: App crashes on login\n---\nID: r3\nText: Good\n---\n");
    }

    #[test]
    fn test_format_counts_characters_not_bytes() {
        // Three characters, nine bytes.
        let batch = vec![Review::new("r1", "好好好")];
        assert!(format_reviews(&batch, 4).is_none());
    }

    #[test]
    fn test_format_all_filtered() {
        let batch = vec![Review::new("r1", ""), Review::new("r2", "meh")];
        assert!(format_reviews(&batch, 4).is_none());
        assert!(format_reviews(&[], 4).is_none());
    }

    #[test]
    fn test_messages_split_instructions_from_reviews() {
        let messages = build_messages("ID: r1\nText: Slow delivery\n---\n");
        assert_eq!(messages.len(), 2);

        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("3-6 words"));
        assert!(messages[0].content.contains("\"reviewId\""));
        assert!(!messages[0].content.contains("Slow delivery"));

        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Reviews:\nID: r1\nText: Slow delivery\n---\n");
    }
}
