use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Owner of a four-level structure tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// Admin-defined master questionnaire
    Template,
    /// A company's instance of a questionnaire for one assessment year
    Assessment,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Template => "template",
            ContainerKind::Assessment => "assessment",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "template" => Ok(ContainerKind::Template),
            "assessment" => Ok(ContainerKind::Assessment),
            other => Err(format!("Unknown container kind '{}'", other)),
        }
    }
}

/// One level of the fixed hierarchy, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Category,
    Topic,
    Factor,
    Content,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Category, Level::Topic, Level::Factor, Level::Content];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Category => "category",
            Level::Topic => "topic",
            Level::Factor => "factor",
            Level::Content => "content",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column metadata shared by the four level tables, so paging, reordering
/// and cloning can be written once over any level.
pub trait LevelEntity: EntityTrait {
    const LEVEL: Level;

    fn id_column() -> Self::Column;
    fn container_column() -> Self::Column;
    fn order_column() -> Self::Column;
    fn name_column() -> Self::Column;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_kind_parsing() {
        assert_eq!("template".parse::<ContainerKind>(), Ok(ContainerKind::Template));
        assert_eq!(" Assessment ".parse::<ContainerKind>(), Ok(ContainerKind::Assessment));
        assert!("company".parse::<ContainerKind>().is_err());
    }

    #[test]
    fn test_levels_are_in_dependency_order() {
        let mut sorted = Level::ALL;
        sorted.sort();
        assert_eq!(sorted, Level::ALL);
        assert!(Level::Category < Level::Content);
    }
}
