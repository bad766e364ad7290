//! Quest Objectives
//!
//! Immutable objective definitions shared by every player holding a quest.
//! Per-player counts live in [`super::state::ObjectiveProgress`].

use serde::{Deserialize, Serialize};

use super::events::{Creature, EventKind};
use super::metadata::MetaData;
use crate::error::QuestError;

/// Objective type codes as understood by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveType {
    Kill = 1,
    Collect = 2,
    Talk = 3,
}

impl ObjectiveType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kill" | "kill_monster" => Some(ObjectiveType::Kill),
            "collect" | "collect_item" => Some(ObjectiveType::Collect),
            "talk" | "talk_to" => Some(ObjectiveType::Talk),
            _ => None,
        }
    }

    /// Event streams an objective of this type needs
    pub fn event_kinds(&self) -> &'static [EventKind] {
        match self {
            ObjectiveType::Kill => &[EventKind::CreatureKilled],
            ObjectiveType::Collect => &[EventKind::ItemReceived, EventKind::ItemRemoved],
            ObjectiveType::Talk => &[EventKind::NpcTalked],
        }
    }
}

/// What an objective asks of the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectiveKind {
    /// Kill `amount` creatures carrying any of the race tags
    Kill { amount: i32, race_tags: Vec<String> },
    /// Hold `amount` of an item
    Collect { item_id: i32, amount: i32 },
    /// Talk to an NPC once
    Talk { npc_name: String },
}

impl ObjectiveKind {
    pub fn kill(amount: i32, race_tags: &[&str]) -> Self {
        ObjectiveKind::Kill {
            amount,
            race_tags: race_tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn collect(item_id: i32, amount: i32) -> Self {
        ObjectiveKind::Collect { item_id, amount }
    }

    pub fn talk(npc_name: &str) -> Self {
        ObjectiveKind::Talk {
            npc_name: npc_name.to_string(),
        }
    }

    pub fn objective_type(&self) -> ObjectiveType {
        match self {
            ObjectiveKind::Kill { .. } => ObjectiveType::Kill,
            ObjectiveKind::Collect { .. } => ObjectiveType::Collect,
            ObjectiveKind::Talk { .. } => ObjectiveType::Talk,
        }
    }

    /// Number required to finish the objective
    pub fn amount(&self) -> i32 {
        match self {
            ObjectiveKind::Kill { amount, .. } => *amount,
            ObjectiveKind::Collect { amount, .. } => *amount,
            ObjectiveKind::Talk { .. } => 1,
        }
    }

    /// True if this is a kill objective and the creature carries one of its tags
    pub fn matches_creature(&self, creature: &Creature) -> bool {
        match self {
            ObjectiveKind::Kill { race_tags, .. } => race_tags.iter().any(|t| creature.has_tag(t)),
            _ => false,
        }
    }

    /// True if this is a collect objective for the item
    pub fn matches_item(&self, item_id: i32) -> bool {
        matches!(self, ObjectiveKind::Collect { item_id: id, .. } if *id == item_id)
    }

    /// True if this is a talk objective for the NPC
    pub fn matches_npc(&self, name: &str) -> bool {
        match self {
            ObjectiveKind::Talk { npc_name } => npc_name.eq_ignore_ascii_case(name),
            _ => false,
        }
    }

    /// Client metadata describing the objective target
    pub fn metadata(&self) -> MetaData {
        let mut meta = MetaData::new();
        match self {
            ObjectiveKind::Kill { amount, race_tags } => {
                meta.set_string("TGTSID", race_tags.join("|"));
                meta.set_int("TARGETCOUNT", *amount);
                meta.set_short("TGTCLS", 0);
            }
            ObjectiveKind::Collect { item_id, amount } => {
                meta.set_int("TARGETITEM", *item_id);
                meta.set_int("TARGETCOUNT", *amount);
                meta.set_int("QO_FLAG", 1);
            }
            ObjectiveKind::Talk { npc_name } => {
                meta.set_string("TARGECHAR", npc_name.as_str());
                meta.set_int("TARGETCOUNT", 1);
            }
        }
        meta
    }
}

/// A resolved quest objective
#[derive(Debug, Clone)]
pub struct QuestObjective {
    pub ident: String,
    pub description: String,
    pub region_id: i32,
    /// Map hint coordinates
    pub x: i32,
    pub y: i32,
    pub kind: ObjectiveKind,
    pub metadata: MetaData,
}

impl QuestObjective {
    pub fn new(
        ident: &str,
        description: &str,
        region_id: i32,
        x: i32,
        y: i32,
        kind: ObjectiveKind,
    ) -> Self {
        let metadata = kind.metadata();
        Self {
            ident: ident.to_string(),
            description: description.to_string(),
            region_id,
            x,
            y,
            kind,
            metadata,
        }
    }

    pub fn amount(&self) -> i32 {
        self.kind.amount()
    }

    pub fn objective_type(&self) -> ObjectiveType {
        self.kind.objective_type()
    }
}

/// Raw objective as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawObjective {
    pub ident: String,
    #[serde(rename = "type")]
    pub objective_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub region: i32,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_amount")]
    pub amount: i32,
    /// Kill: race tags to match
    #[serde(default)]
    pub race_tags: Vec<String>,
    /// Collect: item to hold
    pub item_id: Option<i32>,
    /// Talk: NPC to talk to
    pub npc: Option<String>,
}

fn default_amount() -> i32 {
    1
}

impl ObjectiveKind {
    pub fn from_raw(raw: &RawObjective) -> Result<Self, QuestError> {
        let objective_type = ObjectiveType::from_str(&raw.objective_type)
            .ok_or_else(|| QuestError::UnknownObjectiveType(raw.objective_type.clone()))?;

        match objective_type {
            ObjectiveType::Kill => {
                if raw.race_tags.is_empty() {
                    return Err(QuestError::MissingField {
                        ident: raw.ident.clone(),
                        field: "race_tags",
                    });
                }
                Ok(ObjectiveKind::Kill {
                    amount: raw.amount,
                    race_tags: raw.race_tags.clone(),
                })
            }
            ObjectiveType::Collect => {
                let item_id = raw.item_id.ok_or_else(|| QuestError::MissingField {
                    ident: raw.ident.clone(),
                    field: "item_id",
                })?;
                Ok(ObjectiveKind::Collect {
                    item_id,
                    amount: raw.amount,
                })
            }
            ObjectiveType::Talk => {
                let npc_name = raw.npc.clone().ok_or_else(|| QuestError::MissingField {
                    ident: raw.ident.clone(),
                    field: "npc",
                })?;
                Ok(ObjectiveKind::Talk { npc_name })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_type_parsing() {
        assert_eq!(ObjectiveType::from_str("kill"), Some(ObjectiveType::Kill));
        assert_eq!(ObjectiveType::from_str("Collect_Item"), Some(ObjectiveType::Collect));
        assert_eq!(ObjectiveType::from_str("talk_to"), Some(ObjectiveType::Talk));
        assert_eq!(ObjectiveType::from_str("deliver"), None);
    }

    #[test]
    fn test_kill_matches_any_tag() {
        let kind = ObjectiveKind::kill(3, &["wolf", "fox"]);
        assert!(kind.matches_creature(&Creature::new("Red Fox", &["fox", "animal"])));
        assert!(!kind.matches_creature(&Creature::new("Brown Bear", &["bear"])));
        assert!(!kind.matches_item(501));
    }

    #[test]
    fn test_talk_amount_is_one() {
        let kind = ObjectiveKind::talk("Duncan");
        assert_eq!(kind.amount(), 1);
        assert!(kind.matches_npc("duncan"));
        assert!(!kind.matches_npc("Nora"));
    }

    #[test]
    fn test_objective_metadata() {
        let kill = ObjectiveKind::kill(3, &["wolf", "fox"]).metadata();
        assert_eq!(kill.to_payload(), "TGTSID:s:wolf|fox;TARGETCOUNT:4:3;TGTCLS:2:0;");

        let collect = ObjectiveKind::collect(501, 2).metadata();
        assert_eq!(collect.to_payload(), "TARGETITEM:4:501;TARGETCOUNT:4:2;QO_FLAG:4:1;");
    }

    #[test]
    fn test_from_raw_missing_field() {
        let raw: RawObjective = toml::from_str(
            r#"
ident = "get_wool"
type = "collect"
amount = 5
"#,
        )
        .unwrap();

        let err = ObjectiveKind::from_raw(&raw).unwrap_err();
        assert!(matches!(err, QuestError::MissingField { field: "item_id", .. }));
    }

    #[test]
    fn test_from_raw_unknown_type() {
        let raw: RawObjective = toml::from_str(
            r#"
ident = "deliver_letter"
type = "deliver"
"#,
        )
        .unwrap();

        assert!(matches!(
            ObjectiveKind::from_raw(&raw),
            Err(QuestError::UnknownObjectiveType(t)) if t == "deliver"
        ));
    }
}
