use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Answer recorded for questions left blank
pub const SKIPPED: &str = "Skipped";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_option: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub id: String,
    pub course_id: String,
    #[serde(default)]
    pub topic: String,
    pub questions: Vec<Question>,
}

/// Body of `POST /quiz/generate`; unit 0 covers every unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    pub course_id: String,
    #[serde(default)]
    pub unit: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongQuestion {
    pub question_text: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub wrong_questions: Vec<WrongQuestion>,
}

/// Body of `POST /ai/quiz-analysis`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub course_id: String,
    pub wrong_questions: Vec<WrongQuestion>,
    pub total_questions: usize,
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPriority {
    pub topic: String,
    pub priority: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnalysis {
    #[serde(default)]
    pub weak_areas: Vec<String>,
    #[serde(default)]
    pub study_priorities: Vec<StudyPriority>,
}

impl QuizAnalysis {
    /// Orders priorities High, Medium, Low; anything else goes last
    pub fn sort_priorities(&mut self) {
        self.study_priorities
            .sort_by_key(|item| priority_rank(&item.priority));
    }
}

fn priority_rank(priority: &str) -> u8 {
    match priority.trim().to_ascii_lowercase().as_str() {
        "high" => 0,
        "medium" => 1,
        "low" => 2,
        _ => 3,
    }
}

/// Scores `answers` (question id to chosen option index) against the quiz
pub fn score_quiz(quiz: &Quiz, answers: &HashMap<u32, usize>) -> QuizResult {
    let mut score = 0;
    let mut wrong_questions = Vec::new();

    for question in &quiz.questions {
        let chosen = answers.get(&question.id).copied();
        if chosen == Some(question.correct_option) {
            score += 1;
            continue;
        }

        let user_answer = chosen
            .and_then(|idx| question.options.get(idx))
            .cloned()
            .unwrap_or_else(|| SKIPPED.to_string());

        wrong_questions.push(WrongQuestion {
            question_text: question.text.clone(),
            correct_answer: question
                .options
                .get(question.correct_option)
                .cloned()
                .unwrap_or_default(),
            user_answer,
            reference: question.reference.clone().unwrap_or_default(),
        });
    }

    QuizResult {
        score,
        total: quiz.questions.len(),
        wrong_questions,
    }
}

impl QuizResult {
    pub fn is_perfect(&self) -> bool {
        self.wrong_questions.is_empty()
    }

    /// Analysis request for the mistakes, or None when there are none
    pub fn submission(&self, course_id: &str) -> Option<QuizSubmission> {
        if self.is_perfect() {
            return None;
        }
        Some(QuizSubmission {
            course_id: course_id.to_string(),
            wrong_questions: self.wrong_questions.clone(),
            total_questions: self.total,
            score: self.score,
        })
    }
}
