//! Result type alias for the engine

use super::errors::PsiError;

/// Result type alias for engine operations
///
/// # Examples
///
/// ```
/// use psi_engine::domain::result::Result;
/// use psi_engine::domain::errors::PsiError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(PsiError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, PsiError>;

/// Result type for indicator evaluators
pub type EvalResult<T> = std::result::Result<T, super::errors::EvaluationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::EvaluationError;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_eval_result_converts_into_result() {
        fn evaluate() -> EvalResult<()> {
            Err(EvaluationError::Internal("boom".to_string()))
        }
        fn outer() -> Result<()> {
            evaluate()?;
            Ok(())
        }
        assert!(outer().is_err());
    }
}
