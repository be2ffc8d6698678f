//! Categorical label → integer code lookup.
//!
//! The codes are the NHANES encodings the model was trained with.

use super::schema::Feature;

/// Gender labels in code order (RIAGENDR).
pub const GENDER_LABELS: [&str; 2] = ["男", "女"];

/// Education labels in code order (DMDEDUC2).
pub const EDUCATION_LABELS: [&str; 5] = [
    "九年级以下",
    "九到十一年级（包括十二年级，但无文凭）",
    "高中毕业/GED或同等学历",
    "一些大学或AA学位",
    "大专以上学历",
];

const GENDER_CODES: [(&str, u8); 2] = [("男", 0), ("女", 1)];

const EDUCATION_CODES: [(&str, u8); 5] = [
    ("九年级以下", 0),
    ("九到十一年级（包括十二年级，但无文凭）", 1),
    ("高中毕业/GED或同等学历", 2),
    ("一些大学或AA学位", 3),
    ("大专以上学历", 4),
];

/// Immutable per-feature code table.
pub struct CategoryCodeTable;

impl CategoryCodeTable {
    fn entries(feature: Feature) -> &'static [(&'static str, u8)] {
        match feature {
            Feature::Gender => &GENDER_CODES,
            Feature::Education => &EDUCATION_CODES,
            _ => &[],
        }
    }

    /// Code for `label` under `feature`, or `None` if the table has no such entry.
    #[must_use]
    pub fn code(feature: Feature, label: &str) -> Option<u8> {
        Self::entries(feature)
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, code)| *code)
    }

    /// Labels accepted for `feature`, in code order.
    #[must_use]
    pub fn labels(feature: Feature) -> Vec<&'static str> {
        Self::entries(feature).iter().map(|(l, _)| *l).collect()
    }
}

/// English gloss for a categorical label, shown next to it in the form.
#[must_use]
pub fn english_gloss(label: &str) -> &'static str {
    match label {
        "男" => "male",
        "女" => "female",
        "九年级以下" => "less than 9th grade",
        "九到十一年级（包括十二年级，但无文凭）" => "9-11th grade, or 12th grade without diploma",
        "高中毕业/GED或同等学历" => "high school graduate / GED or equivalent",
        "一些大学或AA学位" => "some college or AA degree",
        "大专以上学历" => "college graduate or above",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(CategoryCodeTable::code(Feature::Gender, "男"), Some(0));
        assert_eq!(CategoryCodeTable::code(Feature::Gender, "女"), Some(1));
        assert_eq!(
            CategoryCodeTable::code(Feature::Education, "高中毕业/GED或同等学历"),
            Some(2)
        );
        assert_eq!(CategoryCodeTable::code(Feature::Education, "大专以上学历"), Some(4));
    }

    #[test]
    fn test_lookup_is_field_specific() {
        // A gender label is not an education level and vice versa.
        assert_eq!(CategoryCodeTable::code(Feature::Education, "男"), None);
        assert_eq!(CategoryCodeTable::code(Feature::Gender, "九年级以下"), None);
        assert_eq!(CategoryCodeTable::code(Feature::Age, "男"), None);
    }

    #[test]
    fn test_label_lists_follow_code_order() {
        for (i, label) in EDUCATION_LABELS.iter().enumerate() {
            assert_eq!(
                CategoryCodeTable::code(Feature::Education, label),
                Some(i as u8)
            );
        }
        for (i, label) in GENDER_LABELS.iter().enumerate() {
            assert_eq!(CategoryCodeTable::code(Feature::Gender, label), Some(i as u8));
        }
        assert_eq!(CategoryCodeTable::labels(Feature::Gender), GENDER_LABELS.to_vec());
    }

    #[test]
    fn test_every_label_has_a_gloss() {
        for label in GENDER_LABELS.iter().chain(EDUCATION_LABELS.iter()) {
            assert!(!english_gloss(label).is_empty(), "{label}");
        }
    }
}
