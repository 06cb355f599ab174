// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::metadata::BuildRecord;

/// Get the tags of a record as a vector of "key:value" strings.
///
/// Order is fixed: `job`, then `node` (only with `tag_node`), `result` and `branch`. Absent
/// values produce no tag.
#[must_use]
pub fn assemble(record: &BuildRecord, tag_node: bool) -> Vec<String> {
    let mut tags = vec![format!("job:{}", record.job)];
    if let Some(node) = record.node.as_ref().filter(|_| tag_node) {
        tags.push(format!("node:{node}"));
    }
    if let Some(result) = &record.result {
        tags.push(format!("result:{result}"));
    }
    if let Some(branch) = &record.branch {
        tags.push(format!("branch:{branch}"));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{BuildResult, EventType};

    fn record() -> BuildRecord {
        BuildRecord {
            hostname: Some("agent-host".to_string()),
            job: "build-x".to_string(),
            number: 1,
            result: Some(BuildResult::Success),
            start_time_secs: 0,
            duration_secs: Some(1.0),
            end_time_secs: Some(1),
            build_url: None,
            node: Some("agent1".to_string()),
            branch: Some("main".to_string()),
            event_type: EventType::BuildResult,
        }
    }

    #[test]
    fn test_all_tags_in_order() {
        assert_eq!(
            assemble(&record(), true),
            vec!["job:build-x", "node:agent1", "result:SUCCESS", "branch:main"]
        );
    }

    #[test]
    fn test_node_tag_disabled() {
        assert_eq!(
            assemble(&record(), false),
            vec!["job:build-x", "result:SUCCESS", "branch:main"]
        );
    }

    #[test]
    fn test_start_record_only_has_job() {
        let record = BuildRecord {
            result: None,
            duration_secs: None,
            end_time_secs: None,
            node: None,
            branch: None,
            event_type: EventType::BuildStart,
            ..record()
        };
        assert_eq!(assemble(&record, true), vec!["job:build-x"]);
    }

    #[test]
    fn test_raw_result_token_is_kept() {
        let record = BuildRecord {
            result: Some(BuildResult::Other("UNSTABLE".to_string())),
            ..record()
        };
        assert!(assemble(&record, false).contains(&"result:UNSTABLE".to_string()));
    }
}
