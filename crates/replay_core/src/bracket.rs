use serde::{Deserialize, Serialize};

/// Skill tier used to partition a corpus of matches before averaging.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillBracket {
    /// Rating above 2200.
    Pro,
    /// Rating above 1800.
    High,
    /// Rating above 1000.
    Middle,
    Low,
}

impl SkillBracket {
    pub fn from_rating(rating: u32) -> Self {
        match rating {
            r if r > 2200 => SkillBracket::Pro,
            r if r > 1800 => SkillBracket::High,
            r if r > 1000 => SkillBracket::Middle,
            _ => SkillBracket::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(SkillBracket::from_rating(2500), SkillBracket::Pro);
        assert_eq!(SkillBracket::from_rating(2200), SkillBracket::High);
        assert_eq!(SkillBracket::from_rating(1801), SkillBracket::High);
        assert_eq!(SkillBracket::from_rating(1800), SkillBracket::Middle);
        assert_eq!(SkillBracket::from_rating(1000), SkillBracket::Low);
        assert_eq!(SkillBracket::from_rating(0), SkillBracket::Low);
    }

    #[test]
    fn test_display_matches_serde_name() {
        assert_eq!(SkillBracket::Middle.to_string(), "middle");
        assert_eq!(
            serde_json::to_string(&SkillBracket::Middle).unwrap(),
            "\"middle\""
        );
    }
}
