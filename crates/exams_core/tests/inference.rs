use exams_core::{
    infer_grade, infer_session_year, Filters, Session, ANA_LABEL, GEC_LABEL, OTHER_LABEL,
};
use pretty_assertions::assert_eq;

fn session(title: &str, url: &str) -> Session {
    Session {
        url: url.to_string(),
        title: title.to_string(),
        grade: infer_grade(&format!("{title} {url}")),
        year: infer_session_year(title, url),
    }
}

#[test]
fn certificate_marker_beats_grade_number() {
    let text = "Gr. 9 (General Education Certificate) Nov 2021";
    let url = "https://www.ecexams.co.za/2021_GEC.htm";

    let s = session(text, url);
    assert_eq!(s.grade, GEC_LABEL);
    assert_eq!(s.year.as_deref(), Some("2021"));
}

#[test]
fn grade_number_variants_are_recognised() {
    assert_eq!(infer_grade("Grade 12 November"), "Grade 12");
    assert_eq!(infer_grade("GR12 Maths"), "Grade 12");
    assert_eq!(infer_grade("gr. 10 June"), "Grade 10");
    assert_eq!(infer_grade("Grade  7 Exemplar"), "Grade 7");
}

#[test]
fn assessment_and_unknown_labels() {
    assert_eq!(infer_grade("Annual National Assessment 2013"), ANA_LABEL);
    assert_eq!(infer_grade("Circulars and notices"), OTHER_LABEL);
}

#[test]
fn year_falls_back_to_url() {
    let s = session("November Grade 12 NSC", "https://example.com/2019/Nov_Gr12.htm");
    assert_eq!(s.year.as_deref(), Some("2019"));

    let s = session("Grade 12 Exemplars", "https://example.com/exemplars.htm");
    assert_eq!(s.year, None);
    assert_eq!(s.year_label(), "Unknown Year");
}

#[test]
fn grade_and_year_filters_select_without_rewriting() {
    let sessions = vec![
        session(
            "2024 November Grade 12 NSC",
            "https://example.com/2024_Nov_Gr12.htm",
        ),
        session("2023 Grade 11", "https://example.com/2023_Gr11.htm"),
        session("2024 Grade 11", "https://example.com/2024_Gr11.htm"),
        session("2023 Grade 12", "https://example.com/2023_Gr12.htm"),
    ];
    let filters = Filters::new(["12"], ["2024"]);

    let selected: Vec<_> = sessions.iter().filter(|s| filters.accepts(s)).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].title, "2024 November Grade 12 NSC");
    assert_eq!(selected[0].grade, "Grade 12");
    assert_eq!(selected[0].year.as_deref(), Some("2024"));
}

#[test]
fn empty_filters_accept_everything() {
    let filters = Filters::default();
    let s = session("Circulars", "https://example.com/circulars.htm");
    assert!(filters.accepts(&s));
}

#[test]
fn year_filter_rejects_sessions_without_year() {
    let filters = Filters::new(Vec::<String>::new(), ["2024"]);
    let s = session("Grade 12 Exemplars", "https://example.com/exemplars.htm");
    assert!(!filters.accepts(&s));
}

#[test]
fn blank_filter_terms_are_ignored() {
    let filters = Filters::new(["  ", ""], [" 2024 "]);
    assert!(filters.accepts_grade("Other"));
    assert!(filters.accepts_year(Some("2024")));
}
