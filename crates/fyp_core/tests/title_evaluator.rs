use fyp_core::evaluator::{MIN_TITLE_CHARS, MIN_TITLE_WORDS, TITLE_KEYWORDS};
use fyp_core::{evaluate_title, TitleRejection};

#[test]
fn library_management_title_is_accepted_with_four_keywords() {
    let evaluation = evaluate_title("Online Library Management System");
    assert!(evaluation.accepted);
    assert_eq!(evaluation.score, 4);
    assert!(evaluation.rejection.is_none());
}

#[test]
fn single_word_title_is_rejected_with_zero_score() {
    let evaluation = evaluate_title("App");
    assert!(!evaluation.accepted);
    assert_eq!(evaluation.score, 0);
    assert_eq!(
        evaluation.rejection,
        Some(TitleRejection::TooShort { words: 1, chars: 3 })
    );
}

#[test]
fn floor_is_inclusive_at_three_words_and_fifteen_chars() {
    let title = "Smart Exam Tool";
    assert_eq!(title.split_whitespace().count(), MIN_TITLE_WORDS);
    assert_eq!(title.chars().count(), MIN_TITLE_CHARS);

    let evaluation = evaluate_title(title);
    assert_eq!(evaluation.rejection, Some(TitleRejection::NoKeywords));
    assert_eq!(evaluation.score, 0);

    let evaluation = evaluate_title("Smart Exam Apps");
    assert!(evaluation.accepted);
    assert_eq!(evaluation.score, 1);
}

#[test]
fn one_char_below_floor_is_too_short_even_with_keywords() {
    let evaluation = evaluate_title("App Portal Sys");
    assert!(!evaluation.accepted);
    assert_eq!(evaluation.score, 0);
    assert_eq!(
        evaluation.rejection,
        Some(TitleRejection::TooShort {
            words: 3,
            chars: 14
        })
    );
}

#[test]
fn two_long_words_fail_the_word_floor() {
    let evaluation = evaluate_title("AttendanceAutomation Management");
    assert!(!evaluation.accepted);
    assert_eq!(evaluation.score, 0);
    assert!(matches!(
        evaluation.rejection,
        Some(TitleRejection::TooShort { words: 2, .. })
    ));
}

#[test]
fn surrounding_whitespace_is_ignored() {
    let padded = evaluate_title("   College Attendance Tracker \n");
    let plain = evaluate_title("College Attendance Tracker");
    assert_eq!(padded, plain);
    assert_eq!(plain.score, 2);
}

#[test]
fn matching_is_case_insensitive() {
    let lower = evaluate_title("student project automation");
    let upper = evaluate_title("STUDENT PROJECT AUTOMATION");
    assert_eq!(lower.score, 3);
    assert_eq!(upper.score, 3);
}

#[test]
fn score_never_exceeds_keyword_count() {
    let title = TITLE_KEYWORDS.join(" ");
    let evaluation = evaluate_title(&title);
    assert_eq!(evaluation.score as usize, TITLE_KEYWORDS.len());
}

#[test]
fn rejection_serializes_with_reason_tag() {
    let evaluation = evaluate_title("Weather Forecast Dashboard");
    let value = serde_json::to_value(evaluation).unwrap();
    assert_eq!(value["accepted"], false);
    assert_eq!(value["rejection"]["reason"], "no_keywords");
}
