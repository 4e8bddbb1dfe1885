//! Saga path progression: derives node status and zig-zag layout from the day pointer.
//!
//! Everything here is pure. Nodes are rebuilt from the raw tasks on every read and are
//! never persisted.

use std::cmp::Ordering;

use db::models::path_task::PathTask;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeStatus {
    Locked,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeSide {
    Left,
    Right,
}

/// A day task as handed over by the path store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPathTask {
    pub id: Uuid,
    pub day_index: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub duration_minutes: i64,
    pub xp_reward: i64,
    pub gems_reward: i64,
}

impl From<PathTask> for RawPathTask {
    fn from(task: PathTask) -> Self {
        Self {
            id: task.id,
            day_index: task.day_index,
            title: task.title,
            subtitle: task.subtitle,
            duration_minutes: task.duration_minutes,
            xp_reward: task.xp_reward,
            gems_reward: task.gems_reward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PathNode {
    pub id: Uuid,
    #[ts(type = "number")]
    pub day_index: i64,
    pub title: String,
    pub subtitle: String,
    #[ts(type = "number")]
    pub duration_minutes: i64,
    #[ts(type = "number")]
    pub xp_reward: i64,
    #[ts(type = "number")]
    pub gems_reward: i64,
    pub status: NodeStatus,
    pub side: NodeSide,
}

/// Read model served to the client for the progress map.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PathView {
    pub phase_label: String,
    #[ts(type = "number")]
    pub phase_number: i64,
    #[ts(type = "number")]
    pub current_day_index: i64,
    pub nodes: Vec<PathNode>,
}

pub fn node_status(day_index: i64, current_day_index: i64) -> NodeStatus {
    match day_index.cmp(&current_day_index) {
        Ordering::Less => NodeStatus::Completed,
        Ordering::Equal => NodeStatus::Active,
        Ordering::Greater => NodeStatus::Locked,
    }
}

/// Side is taken from the rendered position, not from `day_index`.
pub fn node_side(layout_index: usize) -> NodeSide {
    if layout_index % 2 == 0 {
        NodeSide::Left
    } else {
        NodeSide::Right
    }
}

/// Build nodes in input order. Callers pass tasks already sorted by `day_index`.
pub fn build_nodes(tasks: &[RawPathTask], current_day_index: i64) -> Vec<PathNode> {
    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| PathNode {
            id: task.id,
            day_index: task.day_index,
            title: task.title.clone(),
            subtitle: task.subtitle.clone().unwrap_or_default(),
            duration_minutes: task.duration_minutes,
            xp_reward: task.xp_reward,
            gems_reward: task.gems_reward,
            status: node_status(task.day_index, current_day_index),
            side: node_side(i),
        })
        .collect()
}
