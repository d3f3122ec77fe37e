use super::models::{Choice, Field, Record};
use std::collections::BTreeMap;

/// Outcome of validating a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCheck {
    /// One entry per required field, `true` when the field is in error.
    pub errors: BTreeMap<Field, bool>,
    /// Completion percentage, 0 to 100.
    pub progress: u8,
}

impl FormCheck {
    /// Fields in error, in on-screen order.
    pub fn error_fields(&self) -> Vec<Field> {
        self.errors
            .iter()
            .filter(|&(_, &bad)| bad)
            .map(|(&field, _)| field)
            .collect()
    }

    /// The field that should receive focus after a failed submit.
    pub fn first_error(&self) -> Option<Field> {
        self.errors.iter().find(|&(_, &bad)| bad).map(|(&f, _)| f)
    }

    pub fn has_error(&self, field: Field) -> bool {
        self.errors.get(&field).copied().unwrap_or(false)
    }

    pub fn is_valid(&self) -> bool {
        !self.errors.values().any(|&bad| bad)
    }
}

/// Checks required fields and computes form progress.
///
/// Photo presence counts toward progress but never makes the form invalid.
pub struct FormValidator;

impl FormValidator {
    /// Required fields plus the photo.
    pub const TRACKED_FIELDS: usize = Field::REQUIRED.len() + 1;

    pub fn check(record: &Record) -> FormCheck {
        let mut errors = BTreeMap::new();
        let mut valid = usize::from(record.photo.is_some());

        for field in Field::REQUIRED {
            let filled = Self::is_filled(record, field);
            if filled {
                valid += 1;
            }
            errors.insert(field, !filled);
        }

        FormCheck {
            errors,
            progress: Self::percent(valid, Self::TRACKED_FIELDS),
        }
    }

    fn is_filled(record: &Record, field: Field) -> bool {
        match field {
            Field::SkinColor => record.skin_color.is_selected(),
            Field::HairColor => record.hair_color.is_selected(),
            Field::EyeColor => record.eye_color.is_selected(),
            Field::Photo => record.photo.is_some(),
            Field::Children => record.children().iter().any(|c| !c.trim().is_empty()),
            other => record
                .text(other)
                .is_some_and(|v| !v.trim().is_empty() && v != "selecione"),
        }
    }

    // Rounds half up, like the progress bar always has.
    fn percent(valid: usize, total: usize) -> u8 {
        let pct = (200 * valid + total) / (2 * total);
        pct.min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EyeColor, HairColor, Photo, SkinColor};

    fn png_photo() -> Photo {
        Photo::from_bytes("p.png", vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap()
    }

    fn complete_record() -> Record {
        let mut record = Record::default();
        record.full_name = "João da Silva".into();
        record.mother_name = "Maria da Silva".into();
        record.skin_color = SkinColor::Parda;
        record.hair_color = HairColor::Preto;
        record.eye_color = EyeColor::Castanho;
        record
    }

    #[test]
    fn test_empty_record_has_all_required_errors() {
        let check = FormValidator::check(&Record::default());
        assert_eq!(check.progress, 0);
        assert_eq!(check.error_fields(), Field::REQUIRED.to_vec());
        assert_eq!(check.first_error(), Some(Field::FullName));
        assert!(!check.is_valid());
    }

    #[test]
    fn test_complete_record_with_photo_is_full() {
        let mut record = complete_record();
        record.photo = Some(png_photo());
        let check = FormValidator::check(&record);
        assert_eq!(check.progress, 100);
        assert!(check.error_fields().is_empty());
        assert!(check.is_valid());
    }

    #[test]
    fn test_photo_not_required_for_validity() {
        let check = FormValidator::check(&complete_record());
        assert!(check.is_valid());
        assert_eq!(check.progress, 83);
        assert!(!check.errors.contains_key(&Field::Photo));
    }

    #[test]
    fn test_partial_progress_rounds() {
        let mut record = Record::default();
        record.full_name = "Ana".into();
        assert_eq!(FormValidator::check(&record).progress, 17);
        record.mother_name = "Rita".into();
        assert_eq!(FormValidator::check(&record).progress, 33);
        record.skin_color = SkinColor::Branca;
        assert_eq!(FormValidator::check(&record).progress, 50);
        record.photo = Some(png_photo());
        assert_eq!(FormValidator::check(&record).progress, 67);
    }

    #[test]
    fn test_whitespace_counts_as_empty() {
        let mut record = complete_record();
        record.mother_name = "   ".into();
        let check = FormValidator::check(&record);
        assert_eq!(check.error_fields(), vec![Field::MotherName]);
        assert!(check.has_error(Field::MotherName));
        assert!(!check.has_error(Field::FullName));
    }

    #[test]
    fn test_first_error_follows_field_order() {
        let mut record = complete_record();
        record.eye_color = EyeColor::Unselected;
        record.full_name.clear();
        let check = FormValidator::check(&record);
        assert_eq!(check.error_fields(), vec![Field::FullName, Field::EyeColor]);
        assert_eq!(check.first_error(), Some(Field::FullName));
    }

    #[test]
    fn test_check_does_not_mutate() {
        let record = complete_record();
        let before = record.clone();
        let first = FormValidator::check(&record);
        let second = FormValidator::check(&record);
        assert_eq!(record, before);
        assert_eq!(first, second);
    }
}
