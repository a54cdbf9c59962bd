use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, QuizId};
use crate::model::quiz_progress::MAX_SCORE;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("slug cannot be empty")]
    EmptySlug,

    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must offer at least two choices")]
    TooFewChoices,

    #[error("correct choice index {index} is out of bounds for {choices} choices")]
    CorrectChoiceOutOfBounds { index: usize, choices: usize },

    #[error("quiz must have at least one question")]
    NoQuestions,

    #[error("passing score {score} is out of range 0..=100")]
    PassingScoreOutOfRange { score: u8 },

    #[error("course must contain at least one item")]
    EmptyCourse,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// Authored lesson definition.
///
/// `required_duration_secs` is the watch time needed to complete the lesson.
/// Lessons without one (or with zero) are untimed and complete via an explicit
/// mark-complete submission instead of accrued time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    slug: String,
    required_duration_secs: Option<u32>,
}

impl Lesson {
    /// Create a lesson definition. A zero duration is normalized to untimed.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptySlug` if the slug is blank.
    pub fn new(
        id: LessonId,
        slug: impl Into<String>,
        required_duration_secs: Option<u32>,
    ) -> Result<Self, CourseError> {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return Err(CourseError::EmptySlug);
        }

        Ok(Self {
            id,
            slug,
            required_duration_secs: required_duration_secs.filter(|d| *d > 0),
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Required watch time, `None` for untimed lessons.
    #[must_use]
    pub fn required_duration_secs(&self) -> Option<u32> {
        self.required_duration_secs
    }

    #[must_use]
    pub fn is_untimed(&self) -> bool {
        self.required_duration_secs.is_none()
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Single multiple-choice question with one correct choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    prompt: String,
    choices: Vec<String>,
    correct_choice: usize,
}

impl QuizQuestion {
    /// Create a question.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the prompt is blank, fewer than two choices
    /// are offered, or the correct index is out of bounds.
    pub fn new(
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct_choice: usize,
    ) -> Result<Self, CourseError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(CourseError::EmptyPrompt);
        }
        if choices.len() < 2 {
            return Err(CourseError::TooFewChoices);
        }
        if correct_choice >= choices.len() {
            return Err(CourseError::CorrectChoiceOutOfBounds {
                index: correct_choice,
                choices: choices.len(),
            });
        }

        Ok(Self {
            prompt,
            choices,
            correct_choice,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_choice
    }
}

/// Authored quiz definition with its passing threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    slug: String,
    passing_score: u8,
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Create a quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the slug is blank, the passing score exceeds
    /// 100, or there are no questions.
    pub fn new(
        id: QuizId,
        slug: impl Into<String>,
        passing_score: u8,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self, CourseError> {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return Err(CourseError::EmptySlug);
        }
        if passing_score > MAX_SCORE {
            return Err(CourseError::PassingScoreOutOfRange {
                score: passing_score,
            });
        }
        if questions.is_empty() {
            return Err(CourseError::NoQuestions);
        }

        Ok(Self {
            id,
            slug,
            passing_score,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Grade positional answers against this quiz, as a truncated percent.
    ///
    /// Missing answers count as wrong; answers beyond the question count are
    /// ignored. Two correct out of three grades as 66, never rounded up.
    #[must_use]
    pub fn grade(&self, answers: &[usize]) -> u8 {
        let correct = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.is_correct(**answer))
            .count();

        let percent = correct * 100 / self.questions.len();
        u8::try_from(percent).unwrap_or(MAX_SCORE)
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Ordered course entry referencing a lesson or quiz definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseItem {
    Lesson(LessonId),
    Quiz(QuizId),
}

/// Authored course: an ordered sequence of lessons and quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    slug: String,
    items: Vec<CourseItem>,
}

impl Course {
    /// Create a course definition.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the slug is blank or the item list is empty.
    pub fn new(
        id: CourseId,
        slug: impl Into<String>,
        items: Vec<CourseItem>,
    ) -> Result<Self, CourseError> {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return Err(CourseError::EmptySlug);
        }
        if items.is_empty() {
            return Err(CourseError::EmptyCourse);
        }

        Ok(Self { id, slug, items })
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn items(&self) -> &[CourseItem] {
        &self.items
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion::new(
            "pick one",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            correct,
        )
        .unwrap()
    }

    #[test]
    fn zero_duration_normalizes_to_untimed() {
        let lesson = Lesson::new(LessonId::new(1), "intro", Some(0)).unwrap();
        assert!(lesson.is_untimed());
        assert_eq!(lesson.required_duration_secs(), None);
    }

    #[test]
    fn blank_slug_is_rejected() {
        let err = Lesson::new(LessonId::new(1), "  ", Some(120)).unwrap_err();
        assert_eq!(err, CourseError::EmptySlug);
    }

    #[test]
    fn question_rejects_out_of_bounds_correct_choice() {
        let err = QuizQuestion::new("q", vec!["a".to_string(), "b".to_string()], 2).unwrap_err();
        assert!(matches!(err, CourseError::CorrectChoiceOutOfBounds { .. }));
    }

    #[test]
    fn grade_truncates_partial_percentages() {
        let quiz = Quiz::new(
            QuizId::new(1),
            "checkpoint",
            70,
            vec![question(0), question(1), question(2)],
        )
        .unwrap();

        // two of three correct: 66, not 67
        assert_eq!(quiz.grade(&[0, 1, 0]), 66);
        assert_eq!(quiz.grade(&[0, 1, 2]), 100);
        assert_eq!(quiz.grade(&[1, 0, 0]), 0);
    }

    #[test]
    fn grade_treats_missing_answers_as_wrong() {
        let quiz = Quiz::new(
            QuizId::new(1),
            "checkpoint",
            70,
            vec![question(0), question(0), question(0)],
        )
        .unwrap();

        assert_eq!(quiz.grade(&[0]), 33);
        assert_eq!(quiz.grade(&[]), 0);
    }

    #[test]
    fn quiz_rejects_passing_score_above_max() {
        let err = Quiz::new(QuizId::new(1), "checkpoint", 101, vec![question(0)]).unwrap_err();
        assert_eq!(err, CourseError::PassingScoreOutOfRange { score: 101 });
    }

    #[test]
    fn course_requires_items() {
        let err = Course::new(CourseId::new(1), "rust-basics", Vec::new()).unwrap_err();
        assert_eq!(err, CourseError::EmptyCourse);
    }
}
