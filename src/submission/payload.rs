use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One answered question in the case-management payload.
///
/// A node carries either a plain `answer` or a `composite_answer`, a list of
/// groups where each group is itself a list of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadNode {
    Group {
        question: String,
        composite_answer: Vec<Vec<PayloadNode>>,
        machine_name: String,
    },
    Leaf {
        question: String,
        answer: Value,
        machine_name: String,
    },
}

impl PayloadNode {
    pub fn leaf(question: impl Into<String>, answer: Value, machine_name: impl Into<String>) -> Self {
        PayloadNode::Leaf {
            question: question.into(),
            answer,
            machine_name: machine_name.into(),
        }
    }

    pub fn group(
        question: impl Into<String>,
        groups: Vec<Vec<PayloadNode>>,
        machine_name: impl Into<String>,
    ) -> Self {
        PayloadNode::Group {
            question: question.into(),
            composite_answer: groups,
            machine_name: machine_name.into(),
        }
    }

    pub fn machine_name(&self) -> &str {
        match self {
            PayloadNode::Leaf { machine_name, .. } | PayloadNode::Group { machine_name, .. } => {
                machine_name
            }
        }
    }

    pub fn question(&self) -> &str {
        match self {
            PayloadNode::Leaf { question, .. } | PayloadNode::Group { question, .. } => question,
        }
    }
}

/// Body posted to the case-management backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasePayload {
    pub id: String,
    pub title: String,
    pub url: String,
    pub citizen_id: Option<String>,
    pub category: Option<String>,
    pub service: Option<String>,
    pub payload: Vec<PayloadNode>,
}
