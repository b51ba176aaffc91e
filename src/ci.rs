//! CI detection.
//!
//! Every check reads an [`Environment`] snapshot; a variable counts as set
//! only when it is non-empty.

use crate::env::Environment;
use serde::Serialize;
use std::fmt;

pub const CI: &str = "CI";
pub const GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";
pub const GITHUB_WORKSPACE: &str = "GITHUB_WORKSPACE";
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const GITLAB_CI: &str = "GITLAB_CI";
pub const GITLAB_PROJECT_DIR: &str = "CI_PROJECT_DIR";
pub const GITLAB_PROJECT_NAME: &str = "CI_PROJECT_NAME";
pub const JENKINS_URL: &str = "JENKINS_URL";
pub const TRAVIS: &str = "TRAVIS";
pub const CIRCLECI: &str = "CIRCLECI";

const CI_FLAGS: [&str; 6] = [CI, GITHUB_ACTIONS, GITLAB_CI, JENKINS_URL, TRAVIS, CIRCLECI];

const RUN_ID_VARS: [&str; 5] = [
    "GITHUB_RUN_ID",
    "CI_PIPELINE_ID",
    "BUILD_NUMBER",
    "TRAVIS_BUILD_NUMBER",
    "CIRCLE_BUILD_NUM",
];
const COMMIT_VARS: [&str; 5] = [
    "GITHUB_SHA",
    "CI_COMMIT_SHA",
    "GIT_COMMIT",
    "TRAVIS_COMMIT",
    "CIRCLE_SHA1",
];
const BRANCH_VARS: [&str; 5] = [
    "GITHUB_REF_NAME",
    "CI_COMMIT_REF_NAME",
    "GIT_BRANCH",
    "TRAVIS_BRANCH",
    "CIRCLE_BRANCH",
];

/// True when any well-known CI flag is set.
#[must_use]
pub fn is_ci(env: &Environment) -> bool {
    CI_FLAGS.iter().any(|flag| env.is_set(flag))
}

/// GitHub Actions with a checked-out workspace.
#[must_use]
pub fn is_github_actions(env: &Environment) -> bool {
    env.is_set(GITHUB_ACTIONS) && env.is_set(GITHUB_WORKSPACE)
}

#[must_use]
pub fn is_gitlab_ci(env: &Environment) -> bool {
    env.is_set(GITLAB_CI) && env.is_set(GITLAB_PROJECT_DIR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CiProvider {
    GitHubActions,
    GitLab,
    Jenkins,
    Travis,
    CircleCi,
    Generic,
}

impl CiProvider {
    /// Most specific provider whose flag is set; `Generic` when only `CI` is.
    #[must_use]
    pub fn detect(env: &Environment) -> Option<Self> {
        [
            (GITHUB_ACTIONS, Self::GitHubActions),
            (GITLAB_CI, Self::GitLab),
            (JENKINS_URL, Self::Jenkins),
            (TRAVIS, Self::Travis),
            (CIRCLECI, Self::CircleCi),
            (CI, Self::Generic),
        ]
        .into_iter()
        .find_map(|(flag, provider)| env.is_set(flag).then_some(provider))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GitHubActions => "github_actions",
            Self::GitLab => "gitlab",
            Self::Jenkins => "jenkins",
            Self::Travis => "travis",
            Self::CircleCi => "circleci",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for CiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run metadata attached to log output in CI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CiMetadata {
    pub provider: Option<CiProvider>,
    pub run_id: Option<String>,
    pub commit: Option<String>,
    pub branch: Option<String>,
}

impl CiMetadata {
    #[must_use]
    pub fn collect(env: &Environment) -> Self {
        let first = |keys: &[&str]| env.first_set(keys).map(|(_, _, value)| value.to_string());
        Self {
            provider: CiProvider::detect(env),
            run_id: first(&RUN_ID_VARS),
            commit: first(&COMMIT_VARS),
            branch: first(&BRANCH_VARS),
        }
    }

    #[must_use]
    pub const fn is_ci(&self) -> bool {
        self.provider.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_environment_is_not_ci() {
        let env = Environment::from_pairs([("HOME", "/home/dev")]);
        assert!(!is_ci(&env));
        assert!(!is_github_actions(&env));
        assert!(!is_gitlab_ci(&env));
        assert_eq!(CiProvider::detect(&env), None);
    }

    #[test]
    fn any_flag_marks_ci() {
        for flag in CI_FLAGS {
            let env = Environment::from_pairs([(flag, "true")]);
            assert!(is_ci(&env), "{flag} should mark CI");
        }
    }

    #[test]
    fn empty_flag_is_ignored() {
        let env = Environment::from_pairs([("CI", "")]);
        assert!(!is_ci(&env));
    }

    #[test]
    fn github_actions_requires_workspace() {
        let env = Environment::from_pairs([("GITHUB_ACTIONS", "true")]);
        assert!(is_ci(&env));
        assert!(!is_github_actions(&env));

        let env = Environment::from_pairs([
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_WORKSPACE", "/home/runner/work/scry"),
        ]);
        assert!(is_github_actions(&env));
    }

    #[test]
    fn gitlab_requires_project_dir() {
        let env = Environment::from_pairs([("GITLAB_CI", "true")]);
        assert!(!is_gitlab_ci(&env));
        let env = Environment::from_pairs([("GITLAB_CI", "true"), ("CI_PROJECT_DIR", "/builds/scry")]);
        assert!(is_gitlab_ci(&env));
    }

    #[test]
    fn provider_prefers_specific_flag() {
        let env = Environment::from_pairs([("CI", "true"), ("GITLAB_CI", "true")]);
        assert_eq!(CiProvider::detect(&env), Some(CiProvider::GitLab));
        let env = Environment::from_pairs([("CI", "1")]);
        assert_eq!(CiProvider::detect(&env), Some(CiProvider::Generic));
    }

    #[test]
    fn metadata_collects_run_details() {
        let env = Environment::from_pairs([
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_RUN_ID", "42"),
            ("GITHUB_SHA", "abc123"),
            ("GITHUB_REF_NAME", "main"),
        ]);
        let metadata = CiMetadata::collect(&env);
        assert!(metadata.is_ci());
        assert_eq!(metadata.provider, Some(CiProvider::GitHubActions));
        assert_eq!(metadata.run_id.as_deref(), Some("42"));
        assert_eq!(metadata.commit.as_deref(), Some("abc123"));
        assert_eq!(metadata.branch.as_deref(), Some("main"));
        assert_eq!(CiProvider::GitHubActions.to_string(), "github_actions");
    }
}
