pub mod health;
pub mod quizzes;
