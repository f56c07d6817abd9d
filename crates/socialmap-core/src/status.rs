use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Relationship status as written in the source records.
///
/// Unrecognised labels are kept verbatim in [`Status::Other`]; they style with
/// the default key but otherwise behave like any other status.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Friend,
    Cordial,
    BestFriend,
    Companion,
    Rival,
    Dislike,
    Enemy,
    Hate,
    Family,
    LoveInterest,
    Familiar,
    Other(String),
}

impl Status {
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "Friend" => Status::Friend,
            "Cordial" => Status::Cordial,
            "Best Friend" => Status::BestFriend,
            "Companion" => Status::Companion,
            "Rival" => Status::Rival,
            "Dislike" => Status::Dislike,
            "Enemy" => Status::Enemy,
            "Hate" => Status::Hate,
            "Family" => Status::Family,
            "LoveInterest" => Status::LoveInterest,
            "Familiar" => Status::Familiar,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Status::Friend => "Friend",
            Status::Cordial => "Cordial",
            Status::BestFriend => "Best Friend",
            Status::Companion => "Companion",
            Status::Rival => "Rival",
            Status::Dislike => "Dislike",
            Status::Enemy => "Enemy",
            Status::Hate => "Hate",
            Status::Family => "Family",
            Status::LoveInterest => "LoveInterest",
            Status::Familiar => "Familiar",
            Status::Other(label) => label.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Status::Other(_))
    }

    /// Label used when both directions share this status ("Friends", "Rivals", ...).
    pub fn plural_label(&self) -> String {
        match self.label() {
            "Enemy" => "Enemies".to_string(),
            "Family" => "Family Members".to_string(),
            label => format!("{label}s"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        Status::parse(value)
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Status::parse(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_is_preserved() {
        let status = Status::parse("Colleague");
        assert_eq!(status, Status::Other("Colleague".to_string()));
        assert!(!status.is_known());
        assert_eq!(status.label(), "Colleague");
    }

    #[test]
    fn test_plural_labels() {
        assert_eq!(Status::Friend.plural_label(), "Friends");
        assert_eq!(Status::Rival.plural_label(), "Rivals");
        assert_eq!(Status::Enemy.plural_label(), "Enemies");
        assert_eq!(Status::Family.plural_label(), "Family Members");
        assert_eq!(Status::parse("Colleague").plural_label(), "Colleagues");
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&Status::BestFriend).unwrap();
        assert_eq!(json, "\"Best Friend\"");
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Status::BestFriend);
    }
}
