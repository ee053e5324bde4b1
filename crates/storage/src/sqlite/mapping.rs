use quiz_core::model::QuestionId;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization(format!("question_id sign overflow: {v}")))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_ids_reject_negative_values() {
        assert_eq!(question_id_from_i64(7).unwrap(), QuestionId::new(7));
        assert!(question_id_from_i64(-1).is_err());
        assert!(question_id_to_i64(QuestionId::new(u64::MAX)).is_err());
    }

    #[test]
    fn u32_conversion_names_the_field() {
        let err = u32_from_i64("score", -3).unwrap_err();
        assert!(err.to_string().contains("score"));
    }
}
