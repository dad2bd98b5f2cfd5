use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One career in the static catalog.
///
/// `name` is the identity used for deduplication. `category` is overwritten by
/// the loader with the category declared by the file the career came from.
/// Everything the loader does not interpret (overview, advantages, salary, ...)
/// lands in `extra` and is serialized back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerRecord {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub required_skills: RequiredSkills,
    #[serde(default)]
    pub related_skills: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CareerRecord {
    /// Every required skill across all proficiency levels, in file order.
    pub fn all_required_skills(&self) -> impl Iterator<Item = &str> {
        self.required_skills
            .levels()
            .iter()
            .flat_map(|(_, skills)| skills.iter().map(String::as_str))
    }
}

/// Proficiency level label → ordered skills.
///
/// Kept as a list of pairs so the level order of the source file survives a
/// load/serialize cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequiredSkills(Vec<(String, Vec<String>)>);

impl RequiredSkills {
    #[allow(dead_code)]
    pub fn new(levels: Vec<(String, Vec<String>)>) -> Self {
        Self(levels)
    }

    pub fn levels(&self) -> &[(String, Vec<String>)] {
        &self.0
    }
}

impl Serialize for RequiredSkills {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (level, skills) in &self.0 {
            map.serialize_entry(level, skills)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequiredSkills {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LevelsVisitor;

        impl<'de> Visitor<'de> for LevelsVisitor {
            type Value = RequiredSkills;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of proficiency level to a list of skills")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut levels = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((level, skills)) = access.next_entry::<String, Vec<String>>()? {
                    levels.push((level, skills));
                }
                Ok(RequiredSkills(levels))
            }
        }

        deserializer.deserialize_map(LevelsVisitor)
    }
}

/// On-disk shape of one catalog file: a category and the careers under it.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryFile {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub careers: Vec<CareerRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_optional_fields_default_to_empty() {
        let record: CareerRecord = serde_json::from_value(json!({ "name": "Actuary" })).unwrap();
        assert_eq!(record.category, "");
        assert!(record.required_skills.levels().is_empty());
        assert!(record.related_skills.is_empty());
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_required_skills_keep_level_order() {
        // Parsed from text: `json!` objects are key-sorted and would hide the
        // file order.
        let record: CareerRecord = serde_json::from_str(
            r#"{
                "name": "Data Analyst",
                "required_skills": {
                    "beginner": ["Excel"],
                    "advanced": ["Statistics", "SQL"],
                    "intermediate": ["Python"]
                }
            }"#,
        )
        .unwrap();

        let all: Vec<&str> = record.all_required_skills().collect();
        assert_eq!(all, vec!["Excel", "Statistics", "SQL", "Python"]);
        assert_eq!(record.required_skills.levels()[1].0, "advanced");
    }

    #[test]
    fn test_passthrough_fields_survive_serialization() {
        let source = json!({
            "name": "Architect",
            "related_skills": ["AutoCAD"],
            "overview": "Designs buildings.",
            "advantages": ["Creative work"]
        });
        let record: CareerRecord = serde_json::from_value(source).unwrap();
        assert_eq!(record.extra["overview"], "Designs buildings.");

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["overview"], "Designs buildings.");
        assert_eq!(out["advantages"][0], "Creative work");
        assert_eq!(out["name"], "Architect");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result = serde_json::from_value::<CareerRecord>(json!({ "category": "Science" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_category_file_without_careers_is_empty() {
        let file: CategoryFile = serde_json::from_value(json!({ "category": "Law" })).unwrap();
        assert_eq!(file.category, "Law");
        assert!(file.careers.is_empty());
    }
}
