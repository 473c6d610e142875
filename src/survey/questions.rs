use std::collections::HashMap;

/// The survey, in the order answers are stored and exported.
pub const QUESTIONS: [&str; 10] = [
    "What are you interested in?",
    "What do you like to do in your free time?",
    "What is your favourite music genre?",
    "Do you like to travel? Where would you like to go?",
    "Do you have any pets?",
    "What is your favourite film or series?",
    "Do you play any sports? Which ones?",
    "What food do you prefer?",
    "Do you have a hobby few people know about?",
    "What do you want to achieve in the next five years?",
];

pub const QUESTION_COUNT: usize = QUESTIONS.len();

/// Form field name for the 1-based question `number`.
pub fn field_name(number: usize) -> String {
    format!("q{number}")
}

/// Trim every answer and pad or cut the list to exactly one answer per question.
pub fn normalize_answers(answers: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = answers
        .into_iter()
        .take(QUESTION_COUNT)
        .map(|a| a.trim().to_string())
        .collect();
    out.resize(QUESTION_COUNT, String::new());
    out
}

/// Pull `q1..qN` out of a submitted form in question order; missing fields are blank.
pub fn answers_from_form(form: &HashMap<String, String>) -> Vec<String> {
    (1..=QUESTION_COUNT)
        .map(|n| form.get(&field_name(n)).cloned().unwrap_or_default())
        .collect()
}
