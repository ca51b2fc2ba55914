use exams_core::{file_name_with_extension, sanitize_segment, MAX_SEGMENT_CHARS};
use pretty_assertions::assert_eq;

const ILLEGAL: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

#[test]
fn exam_filename_is_cleaned_and_stable() {
    let raw = "Exam: Paper? <Final>.pdf";
    let once = sanitize_segment(raw);

    assert_eq!(once, "Exam Paper Final.pdf");
    assert!(!once.contains(ILLEGAL));
    assert!(!once.contains("  "));
    assert_eq!(sanitize_segment(&once), once);
}

#[test]
fn whitespace_runs_collapse_and_ends_trim() {
    assert_eq!(sanitize_segment("  Grade\t12 \n\n Maths  "), "Grade 12 Maths");
}

#[test]
fn tabs_and_newlines_separate_words() {
    assert_eq!(sanitize_segment("Grade\t12\nMaths"), "Grade 12 Maths");
    assert_eq!(sanitize_segment("Paper\r\n1\u{7}"), "Paper 1");
    assert_eq!(sanitize_segment("Grade 12 Maths"), "Grade 12 Maths");
}

#[test]
fn long_segments_truncate_and_stay_stable() {
    let raw = format!("{} tail", "word ".repeat(60));
    let once = sanitize_segment(&raw);
    assert!(once.chars().count() <= MAX_SEGMENT_CHARS);
    assert!(!once.ends_with(' '));
    assert_eq!(sanitize_segment(&once), once);
}

#[test]
fn extension_is_appended_within_the_limit() {
    assert_eq!(file_name_with_extension("Maths P1", "pdf"), "Maths P1.pdf");
    assert_eq!(file_name_with_extension("Memo.PDF", "pdf"), "Memo.PDF");

    let long = file_name_with_extension(&"x".repeat(200), "docx");
    assert_eq!(long.chars().count(), MAX_SEGMENT_CHARS);
    assert!(long.ends_with(".docx"));
    assert_eq!(sanitize_segment(&long), long);
}

#[test]
fn path_separators_cannot_escape_the_segment() {
    let cleaned = sanitize_segment("../../etc/passwd");
    assert!(!cleaned.contains('/'));
    assert_ne!(cleaned, "..");
}
