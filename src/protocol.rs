//! Client Protocol
//!
//! Quest messages sent to game clients, encoded as MessagePack arrays of
//! `[13, "msgType", {data}]` (Colyseus ROOM_DATA framing).

use rmpv::Value;
use serde::Serialize;

use crate::error::QuestError;
use crate::quest::{QuestDefinition, QuestId, QuestNotification, QuestProgress};

const ROOM_DATA: u8 = 13;

/// Objective state as shown in the quest log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestObjectiveData {
    pub ident: String,
    pub count: i32,
    pub done: bool,
}

/// Objective as sent when a quest is received, with its map hint and
/// target metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestObjectiveDetail {
    pub ident: String,
    pub description: String,
    pub region_id: i32,
    pub x: i32,
    pub y: i32,
    pub metadata: String,
    pub count: i32,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ServerMessage {
    QuestStarted {
        quest_id: QuestId,
        quest_name: String,
        metadata: String,
        objectives: Vec<QuestObjectiveDetail>,
    },
    QuestUpdate {
        quest_id: QuestId,
        current_objective: Option<String>,
        objectives: Vec<QuestObjectiveData>,
    },
    QuestCompleted {
        quest_id: QuestId,
        rewards: Vec<String>,
    },
    QuestAbandoned {
        quest_id: QuestId,
    },
}

impl ServerMessage {
    pub fn msg_type(&self) -> &'static str {
        match self {
            ServerMessage::QuestStarted { .. } => "questStarted",
            ServerMessage::QuestUpdate { .. } => "questUpdate",
            ServerMessage::QuestCompleted { .. } => "questCompleted",
            ServerMessage::QuestAbandoned { .. } => "questAbandoned",
        }
    }

    /// Build the client message for an engine notification. The definition
    /// supplies display fields for newly started quests.
    pub fn from_notification(
        notification: &QuestNotification,
        quest: Option<&QuestDefinition>,
    ) -> Self {
        match notification {
            QuestNotification::Started { progress, .. } => ServerMessage::QuestStarted {
                quest_id: progress.quest_id,
                quest_name: quest.map(|q| q.name().to_string()).unwrap_or_default(),
                metadata: quest.map(|q| q.metadata().to_payload()).unwrap_or_default(),
                objectives: objective_details(progress, quest),
            },
            QuestNotification::ProgressChanged { progress, .. } => ServerMessage::QuestUpdate {
                quest_id: progress.quest_id,
                current_objective: progress.current_ident().map(str::to_string),
                objectives: objective_data(progress),
            },
            QuestNotification::Completed { quest_id, rewards, .. } => {
                ServerMessage::QuestCompleted {
                    quest_id: *quest_id,
                    rewards: rewards.iter().map(|r| r.to_string()).collect(),
                }
            }
            QuestNotification::Abandoned { quest_id, .. } => {
                ServerMessage::QuestAbandoned { quest_id: *quest_id }
            }
        }
    }
}

fn objective_data(progress: &QuestProgress) -> Vec<QuestObjectiveData> {
    progress
        .objectives
        .iter()
        .map(|o| QuestObjectiveData {
            ident: o.ident.clone(),
            count: o.count,
            done: o.done,
        })
        .collect()
}

/// Progress entries joined with their definitions. Entries whose
/// definition is unavailable keep empty display fields.
fn objective_details(
    progress: &QuestProgress,
    quest: Option<&QuestDefinition>,
) -> Vec<QuestObjectiveDetail> {
    progress
        .objectives
        .iter()
        .map(|o| {
            let objective = quest.and_then(|q| q.get_objective(&o.ident));
            QuestObjectiveDetail {
                ident: o.ident.clone(),
                description: objective.map(|d| d.description.clone()).unwrap_or_default(),
                region_id: objective.map_or(0, |d| d.region_id),
                x: objective.map_or(0, |d| d.x),
                y: objective.map_or(0, |d| d.y),
                metadata: objective.map(|d| d.metadata.to_payload()).unwrap_or_default(),
                count: o.count,
                done: o.done,
            }
        })
        .collect()
}

fn objective_details_value(objectives: &[QuestObjectiveDetail]) -> Value {
    Value::Array(
        objectives
            .iter()
            .map(|obj| {
                Value::Map(vec![
                    (Value::String("ident".into()), Value::String(obj.ident.clone().into())),
                    (
                        Value::String("description".into()),
                        Value::String(obj.description.clone().into()),
                    ),
                    (
                        Value::String("region_id".into()),
                        Value::Integer((obj.region_id as i64).into()),
                    ),
                    (Value::String("x".into()), Value::Integer((obj.x as i64).into())),
                    (Value::String("y".into()), Value::Integer((obj.y as i64).into())),
                    (Value::String("metadata".into()), Value::String(obj.metadata.clone().into())),
                    (Value::String("count".into()), Value::Integer((obj.count as i64).into())),
                    (Value::String("done".into()), Value::Boolean(obj.done)),
                ])
            })
            .collect(),
    )
}

fn objectives_value(objectives: &[QuestObjectiveData]) -> Value {
    Value::Array(
        objectives
            .iter()
            .map(|obj| {
                Value::Map(vec![
                    (Value::String("ident".into()), Value::String(obj.ident.clone().into())),
                    (Value::String("count".into()), Value::Integer((obj.count as i64).into())),
                    (Value::String("done".into()), Value::Boolean(obj.done)),
                ])
            })
            .collect(),
    )
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a server message to MessagePack format
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, QuestError> {
    let data = match msg {
        ServerMessage::QuestStarted {
            quest_id,
            quest_name,
            metadata,
            objectives,
        } => Value::Map(vec![
            (Value::String("quest_id".into()), Value::Integer((*quest_id as u64).into())),
            (Value::String("quest_name".into()), Value::String(quest_name.clone().into())),
            (Value::String("metadata".into()), Value::String(metadata.clone().into())),
            (Value::String("objectives".into()), objective_details_value(objectives)),
        ]),
        ServerMessage::QuestUpdate { quest_id, current_objective, objectives } => Value::Map(vec![
            (Value::String("quest_id".into()), Value::Integer((*quest_id as u64).into())),
            (
                Value::String("current_objective".into()),
                match current_objective {
                    Some(ident) => Value::String(ident.clone().into()),
                    None => Value::Nil,
                },
            ),
            (Value::String("objectives".into()), objectives_value(objectives)),
        ]),
        ServerMessage::QuestCompleted { quest_id, rewards } => Value::Map(vec![
            (Value::String("quest_id".into()), Value::Integer((*quest_id as u64).into())),
            (
                Value::String("rewards".into()),
                Value::Array(rewards.iter().map(|r| Value::String(r.clone().into())).collect()),
            ),
        ]),
        ServerMessage::QuestAbandoned { quest_id } => Value::Map(vec![(
            Value::String("quest_id".into()),
            Value::Integer((*quest_id as u64).into()),
        )]),
    };

    let array = Value::Array(vec![
        Value::Integer(ROOM_DATA.into()),
        Value::String(msg.msg_type().into()),
        data,
    ]);

    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &array).map_err(|e| QuestError::Encode(e.to_string()))?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::{ObjectiveKind, QuestBuilder, Reward};
    use std::io::Cursor;

    fn find<'a>(map: &'a Value, key: &str) -> &'a Value {
        map.as_map()
            .and_then(|m| m.iter().find(|(k, _)| k.as_str() == Some(key)))
            .map(|(_, v)| v)
            .unwrap()
    }

    #[test]
    fn test_encode_quest_update() {
        let mut builder = QuestBuilder::new(10);
        builder.add_objective("kill", "", 0, 0, 0, ObjectiveKind::kill(3, &["wolf"])).unwrap();
        builder.add_objective("collect", "", 0, 0, 0, ObjectiveKind::collect(501, 2)).unwrap();
        let quest = builder.init();

        let mut progress = QuestProgress::new(&quest);
        progress.objectives[0].count = 3;
        progress.set_done("kill");

        let notification = QuestNotification::ProgressChanged {
            player_id: "alice".to_string(),
            progress,
        };
        let msg = ServerMessage::from_notification(&notification, Some(&quest));
        let bytes = encode_server_message(&msg).unwrap();

        let value = rmpv::decode::read_value(&mut Cursor::new(bytes)).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array[0].as_u64(), Some(13));
        assert_eq!(array[1].as_str(), Some("questUpdate"));
        assert_eq!(find(&array[2], "quest_id").as_u64(), Some(10));
        assert_eq!(find(&array[2], "current_objective").as_str(), Some("collect"));

        let objectives = find(&array[2], "objectives").as_array().unwrap();
        assert_eq!(objectives.len(), 2);
        assert_eq!(find(&objectives[0], "count").as_i64(), Some(3));
        assert_eq!(find(&objectives[0], "done").as_bool(), Some(true));
    }

    #[test]
    fn test_encode_quest_started_with_objective_details() {
        let mut builder = QuestBuilder::new(10);
        builder.set_name("Wolf Hunt");
        builder
            .add_objective(
                "kill",
                "Hunt 3 wolves",
                1,
                12800,
                38100,
                ObjectiveKind::kill(3, &["wolf"]),
            )
            .unwrap();
        builder
            .add_objective(
                "collect",
                "Gather pelts",
                1,
                12900,
                38200,
                ObjectiveKind::collect(501, 2),
            )
            .unwrap();
        let quest = builder.init();

        let notification = QuestNotification::Started {
            player_id: "alice".to_string(),
            progress: QuestProgress::new(&quest),
        };
        let msg = ServerMessage::from_notification(&notification, Some(&quest));
        let ServerMessage::QuestStarted { objectives, metadata, .. } = &msg else {
            panic!("expected QuestStarted, got {:?}", msg);
        };
        assert!(metadata.starts_with("QSTTIP:s:N_Wolf Hunt|"));
        assert_eq!(objectives[0].description, "Hunt 3 wolves");
        assert_eq!(objectives[1].x, 12900);
        assert_eq!(objectives[1].metadata, quest.objectives()[1].metadata.to_payload());
        assert!(objectives[1].metadata.contains("TARGETITEM:4:501;"));

        let bytes = encode_server_message(&msg).unwrap();
        let value = rmpv::decode::read_value(&mut Cursor::new(bytes)).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array[1].as_str(), Some("questStarted"));

        let encoded = find(&array[2], "objectives").as_array().unwrap();
        assert_eq!(find(&encoded[0], "region_id").as_i64(), Some(1));
        assert_eq!(find(&encoded[0], "y").as_i64(), Some(38100));
        assert!(find(&encoded[0], "metadata").as_str().unwrap().contains("TGTSID:s:wolf;"));
    }

    #[test]
    fn test_completed_rewards_are_rendered() {
        let notification = QuestNotification::Completed {
            player_id: "alice".to_string(),
            quest_id: 10,
            rewards: vec![Reward::gold(50), Reward::item(501, 1)],
        };

        let msg = ServerMessage::from_notification(&notification, None);
        assert_eq!(
            msg,
            ServerMessage::QuestCompleted {
                quest_id: 10,
                rewards: vec!["50 Gold".to_string(), "Item 501 x1".to_string()],
            }
        );
    }
}
