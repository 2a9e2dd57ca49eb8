//! Project mapping

use crate::mapping::normalize_tags;
use crate::schema::ProjectConfig;
use cfclient::{Project, variables_from_map, variables_to_map};

/// Build the API payload; `id` is empty for creates
pub fn to_api(config: &ProjectConfig, id: &str) -> Project {
    Project {
        id: id.to_string(),
        project_name: config.name.clone(),
        tags: normalize_tags(&config.tags),
        variables: variables_from_map(&config.variables),
    }
}

pub fn from_api(project: &Project) -> ProjectConfig {
    ProjectConfig {
        name: project.project_name.clone(),
        tags: normalize_tags(&project.tags),
        variables: variables_to_map(&project.variables),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfclient::Variable;
    use std::collections::BTreeMap;

    #[test]
    fn test_round_trip() {
        let config = ProjectConfig {
            name: "web".into(),
            tags: vec!["b".into(), "a".into()],
            variables: BTreeMap::from([("REGION".into(), "eu".into())]),
        };

        let project = to_api(&config, "p1");
        assert_eq!(project.id, "p1");
        assert_eq!(project.tags, vec!["a", "b"]);
        assert_eq!(project.variables, vec![Variable::new("REGION", "eu")]);

        let back = from_api(&project);
        assert_eq!(back.name, "web");
        assert_eq!(back.tags, vec!["a", "b"]);
        assert_eq!(back.variables, config.variables);
    }
}
