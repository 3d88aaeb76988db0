//! GraphQL v4 documents and response decoding.
//!
//! Topics and branch-protection rules only exist (or are only writable) in
//! GraphQL; everything else goes through REST.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use orgaudit_core::gateway::{BranchProtectionRulePatch, NewBranchProtectionRule, RuleId};
use orgaudit_core::GatewayError;

/// Topics are read in a single page of this size.
pub const TOPICS_PAGE_SIZE: u32 = 50;

pub const REPOSITORY_TOPICS: &str = r#"
query RepositoryTopics($owner: String!, $name: String!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    repositoryTopics(first: $first) {
      pageInfo { hasNextPage }
      nodes { topic { name } }
    }
  }
}"#;

pub const BRANCH_PROTECTION_RULES: &str = r#"
query BranchProtectionRules($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    branchProtectionRules(first: 100) {
      nodes { id pattern }
    }
  }
}"#;

pub const CREATE_BRANCH_PROTECTION_RULE: &str = r#"
mutation CreateBranchProtectionRule($input: CreateBranchProtectionRuleInput!) {
  createBranchProtectionRule(input: $input) { clientMutationId }
}"#;

pub const UPDATE_BRANCH_PROTECTION_RULE: &str = r#"
mutation UpdateBranchProtectionRule($input: UpdateBranchProtectionRuleInput!) {
  updateBranchProtectionRule(input: $input) { clientMutationId }
}"#;

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub query: &'a str,
    pub variables: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ErrorPayload>,
}

/// Unwrap a GraphQL envelope; `NOT_FOUND` errors become the absence signal.
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, GatewayError> {
    let envelope: Envelope<T> = serde_json::from_value(body)?;
    if let Some(first) = envelope.errors.first() {
        let message = envelope
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(match first.kind.as_deref() {
            Some("NOT_FOUND") => GatewayError::NotFound(message),
            Some("RATE_LIMITED") => GatewayError::RateLimited {
                retry_after_secs: 60,
            },
            _ => GatewayError::Api {
                status: 200,
                message,
            },
        });
    }
    envelope
        .data
        .ok_or_else(|| GatewayError::Decode("GraphQL response without data".to_string()))
}

#[derive(Debug, Deserialize)]
struct TopicName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TopicNode {
    topic: TopicName,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicConnection {
    page_info: PageInfo,
    nodes: Vec<TopicNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicsRepository {
    repository_topics: TopicConnection,
}

#[derive(Debug, Deserialize)]
struct TopicsData {
    repository: Option<TopicsRepository>,
}

pub fn topics_variables(owner: &str, name: &str) -> Value {
    json!({ "owner": owner, "name": name, "first": TOPICS_PAGE_SIZE })
}

/// Topic names of a repository; more than one page is an invariant violation.
pub fn parse_topics(body: Value, full_name: &str) -> Result<Vec<String>, GatewayError> {
    let data: TopicsData = decode(body)?;
    let repository = data
        .repository
        .ok_or_else(|| GatewayError::NotFound(full_name.to_string()))?;
    let connection = repository.repository_topics;
    if connection.page_info.has_next_page {
        return Err(GatewayError::Invariant(format!(
            "{full_name} has more than {TOPICS_PAGE_SIZE} topics"
        )));
    }
    Ok(connection.nodes.into_iter().map(|n| n.topic.name).collect())
}

#[derive(Debug, Deserialize)]
struct RuleNode {
    id: String,
    pattern: String,
}

#[derive(Debug, Deserialize)]
struct RuleConnection {
    nodes: Vec<RuleNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RulesRepository {
    branch_protection_rules: RuleConnection,
}

#[derive(Debug, Deserialize)]
struct RulesData {
    repository: Option<RulesRepository>,
}

pub fn rules_variables(owner: &str, name: &str) -> Value {
    json!({ "owner": owner, "name": name })
}

/// Id of the rule whose pattern is exactly `branch`.
pub fn parse_rule_id(body: Value, branch: &str) -> Result<Option<RuleId>, GatewayError> {
    let data: RulesData = decode(body)?;
    Ok(data.repository.and_then(|repository| {
        repository
            .branch_protection_rules
            .nodes
            .into_iter()
            .find(|rule| rule.pattern == branch)
            .map(|rule| RuleId::new(rule.id))
    }))
}

/// `CreateBranchProtectionRuleInput` with the rule fields flattened in.
pub fn create_rule_input(rule: &NewBranchProtectionRule) -> Result<Value, GatewayError> {
    let mut input = serde_json::to_value(&rule.fields)?;
    if let Value::Object(map) = &mut input {
        map.insert("repositoryId".into(), json!(rule.repository_node_id));
        map.insert("pattern".into(), json!(rule.pattern));
    }
    Ok(json!({ "input": input }))
}

/// `UpdateBranchProtectionRuleInput` carrying only the fields set in `patch`.
pub fn update_rule_input(
    rule_id: &RuleId,
    patch: &BranchProtectionRulePatch,
) -> Result<Value, GatewayError> {
    let mut input = serde_json::to_value(patch)?;
    if let Value::Object(map) = &mut input {
        map.insert("branchProtectionRuleId".into(), json!(rule_id.as_str()));
    }
    Ok(json!({ "input": input }))
}
