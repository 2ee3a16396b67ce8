use rand::distributions::Alphanumeric;
use rand::Rng;
use time::OffsetDateTime;

use super::graph::{NodeDataPatch, SubTopic, Topic, TopicStyle};
use super::store::GraphStore;

/// Partial update for a topic. `style: Some(None)` removes the custom style.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicPatch {
    pub label: Option<String>,
    pub style: Option<Option<TopicStyle>>,
}

// Timestamp plus a random suffix, re-rolled on the (unlikely) clash with a
// sibling id.
fn fresh_id<'a>(prefix: &str, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    loop {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|c| (c as char).to_ascii_lowercase())
            .collect();
        let id = format!("{}-{}-{}", prefix, ms, suffix);
        if !taken.clone().any(|t| t == id) {
            return id;
        }
    }
}

impl GraphStore {
    fn topics_of(&self, node_id: &str) -> Option<Vec<Topic>> {
        self.graph.get_node(node_id).map(|n| n.data.topics.clone().unwrap_or_default())
    }

    // Snapshot, then write a rebuilt list back without a second snapshot
    fn commit_topics(&mut self, node_id: &str, topics: Vec<Topic>) -> bool {
        self.checkpoint();
        self.apply_patch(node_id, &NodeDataPatch::topics(topics))
    }

    pub fn add_topic(&mut self, node_id: &str, label: impl Into<String>) -> Option<String> {
        let mut topics = self.topics_of(node_id)?;
        let id = fresh_id("topic", topics.iter().map(|t| t.id.as_str()));
        topics.push(Topic { id: id.clone(), label: label.into(), sub_topics: Vec::new(), style: None });
        self.commit_topics(node_id, topics);
        Some(id)
    }

    pub fn update_topic(&mut self, node_id: &str, topic_id: &str, patch: &TopicPatch) -> bool {
        let Some(topics) = self.topics_of(node_id) else { return false };
        if !topics.iter().any(|t| t.id == topic_id) {
            return false;
        }
        let topics = topics
            .into_iter()
            .map(|t| {
                if t.id != topic_id {
                    return t;
                }
                Topic {
                    label: patch.label.clone().unwrap_or(t.label),
                    style: patch.style.clone().unwrap_or(t.style),
                    ..t
                }
            })
            .collect();
        self.commit_topics(node_id, topics)
    }

    pub fn delete_topic(&mut self, node_id: &str, topic_id: &str) -> bool {
        let Some(mut topics) = self.topics_of(node_id) else { return false };
        let before = topics.len();
        topics.retain(|t| t.id != topic_id);
        if topics.len() == before {
            return false;
        }
        self.commit_topics(node_id, topics)
    }

    pub fn add_sub_topic(&mut self, node_id: &str, topic_id: &str, label: impl Into<String>) -> Option<String> {
        let mut topics = self.topics_of(node_id)?;
        let topic = topics.iter_mut().find(|t| t.id == topic_id)?;
        let id = fresh_id("subtopic", topic.sub_topics.iter().map(|s| s.id.as_str()));
        topic.sub_topics.push(SubTopic { id: id.clone(), label: label.into() });
        self.commit_topics(node_id, topics);
        Some(id)
    }

    pub fn update_sub_topic(&mut self, node_id: &str, topic_id: &str, sub_id: &str, label: impl Into<String>) -> bool {
        let Some(mut topics) = self.topics_of(node_id) else { return false };
        let Some(sub) = topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .and_then(|t| t.sub_topics.iter_mut().find(|s| s.id == sub_id))
        else {
            return false;
        };
        sub.label = label.into();
        self.commit_topics(node_id, topics)
    }

    pub fn delete_sub_topic(&mut self, node_id: &str, topic_id: &str, sub_id: &str) -> bool {
        let Some(mut topics) = self.topics_of(node_id) else { return false };
        let Some(topic) = topics.iter_mut().find(|t| t.id == topic_id) else { return false };
        let before = topic.sub_topics.len();
        topic.sub_topics.retain(|s| s.id != sub_id);
        if topic.sub_topics.len() == before {
            return false;
        }
        self.commit_topics(node_id, topics)
    }
}
