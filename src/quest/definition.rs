//! Quest Definition Structures
//!
//! The immutable quest template shared by all players, the builder used to
//! assemble it, and the raw structures deserialized from TOML quest files.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{error, warn};

use super::events::EventKind;
use super::metadata::MetaData;
use super::objective::{ObjectiveKind, QuestObjective, RawObjective};
use super::prerequisite::Prerequisite;
use super::reward::Reward;
use crate::error::QuestError;

pub type QuestId = u32;

/// How a player obtains the quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantMethod {
    /// Player-initiated (NPC, item, etc.)
    #[default]
    #[serde(alias = "manually")]
    Manual,
    /// Given on login once prerequisites are met
    #[serde(alias = "auto")]
    Automatic,
}

// ============================================================================
// Raw Quest Structures (TOML)
// ============================================================================

/// A quest definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: QuestId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub receive: GrantMethod,
    #[serde(default = "default_cancelable")]
    pub cancelable: bool,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    #[serde(default)]
    pub objectives: Vec<RawObjective>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

fn default_cancelable() -> bool {
    true
}

// ============================================================================
// Resolved Quest Structures
// ============================================================================

/// A fully resolved, immutable quest definition
#[derive(Debug, Clone)]
pub struct QuestDefinition {
    id: QuestId,
    name: String,
    description: String,
    grant_method: GrantMethod,
    cancelable: bool,
    prerequisites: Vec<Prerequisite>,
    objectives: Vec<QuestObjective>,
    rewards: Vec<Reward>,
    metadata: MetaData,
    subscriptions: BTreeSet<EventKind>,
}

impl QuestDefinition {
    /// Create a quest from raw TOML data. Objective errors fail the whole
    /// quest; duplicate idents are logged and skipped.
    pub fn from_raw(raw: &RawQuest) -> Result<Self, QuestError> {
        let mut builder = QuestBuilder::new(raw.id);
        builder
            .set_name(&raw.name)
            .set_description(&raw.description)
            .set_receive_method(raw.receive)
            .set_cancelable(raw.cancelable);

        for prerequisite in &raw.prerequisites {
            builder.add_prerequisite(prerequisite.clone());
        }

        for objective in &raw.objectives {
            let kind = ObjectiveKind::from_raw(objective)?;
            // Already logged by the builder
            let _ = builder.add_objective(
                &objective.ident,
                &objective.description,
                objective.region,
                objective.x,
                objective.y,
                kind,
            );
        }

        if builder.objectives.is_empty() {
            return Err(QuestError::NoObjectives(raw.id));
        }

        for reward in &raw.rewards {
            builder.add_reward(reward.clone());
        }

        Ok(builder.init())
    }

    pub fn id(&self) -> QuestId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn grant_method(&self) -> GrantMethod {
        self.grant_method
    }

    pub fn is_automatic(&self) -> bool {
        self.grant_method == GrantMethod::Automatic
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn prerequisites(&self) -> &[Prerequisite] {
        &self.prerequisites
    }

    /// Objectives in definition order
    pub fn objectives(&self) -> &[QuestObjective] {
        &self.objectives
    }

    /// Get objective by ident
    pub fn get_objective(&self, ident: &str) -> Option<&QuestObjective> {
        self.objectives.iter().find(|o| o.ident == ident)
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    /// Event streams the engine must deliver to this quest
    pub fn subscriptions(&self) -> &BTreeSet<EventKind> {
        &self.subscriptions
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`QuestDefinition`] before it is published with [`QuestBuilder::init`]
#[derive(Debug, Clone, Default)]
pub struct QuestBuilder {
    id: QuestId,
    name: String,
    description: String,
    grant_method: GrantMethod,
    cancelable: bool,
    prerequisites: Vec<Prerequisite>,
    objectives: Vec<QuestObjective>,
    objective_index: HashMap<String, usize>,
    rewards: Vec<Reward>,
    subscriptions: BTreeSet<EventKind>,
}

impl QuestBuilder {
    pub fn new(id: QuestId) -> Self {
        Self {
            id,
            cancelable: true,
            ..Self::default()
        }
    }

    pub fn set_id(&mut self, id: QuestId) -> &mut Self {
        self.id = id;
        self
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    pub fn set_description(&mut self, description: &str) -> &mut Self {
        self.description = description.to_string();
        self
    }

    pub fn set_receive_method(&mut self, method: GrantMethod) -> &mut Self {
        self.grant_method = method;
        self
    }

    pub fn set_cancelable(&mut self, cancelable: bool) -> &mut Self {
        self.cancelable = cancelable;
        self
    }

    /// Add a prerequisite that has to be met before auto receiving the quest
    pub fn add_prerequisite(&mut self, prerequisite: Prerequisite) -> &mut Self {
        self.prerequisites.push(prerequisite);
        self
    }

    /// Add an objective that has to be cleared to complete the quest.
    ///
    /// Idents must be unique. A duplicate is logged and rejected, leaving
    /// the builder unchanged.
    pub fn add_objective(
        &mut self,
        ident: &str,
        description: &str,
        region_id: i32,
        x: i32,
        y: i32,
        kind: ObjectiveKind,
    ) -> Result<(), QuestError> {
        if self.objective_index.contains_key(ident) {
            let err = QuestError::DuplicateObjective {
                quest_id: self.id,
                ident: ident.to_string(),
            };
            error!("{}", err);
            return Err(err);
        }

        if kind.amount() <= 0 {
            warn!(
                "Quest {}: objective '{}' has non-positive amount {}",
                self.id, ident, kind.amount()
            );
        }

        self.subscriptions
            .extend(kind.objective_type().event_kinds().iter().copied());

        self.objective_index
            .insert(ident.to_string(), self.objectives.len());
        self.objectives
            .push(QuestObjective::new(ident, description, region_id, x, y, kind));

        Ok(())
    }

    pub fn add_reward(&mut self, reward: Reward) -> &mut Self {
        self.rewards.push(reward);
        self
    }

    /// Finalize metadata and publish the immutable definition
    pub fn init(self) -> QuestDefinition {
        let rewards = self
            .rewards
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let mut metadata = MetaData::new();
        metadata.set_string(
            "QSTTIP",
            format!("N_{}|D_{}|A_|R_{}|T_0", self.name, self.description, rewards),
        );

        let mut subscriptions = self.subscriptions;
        if self.grant_method == GrantMethod::Automatic {
            subscriptions.insert(EventKind::PlayerLoggedIn);
        }

        QuestDefinition {
            id: self.id,
            name: self.name,
            description: self.description,
            grant_method: self.grant_method,
            cancelable: self.cancelable,
            prerequisites: self.prerequisites,
            objectives: self.objectives,
            rewards: self.rewards,
            metadata,
            subscriptions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wolf_hunt() -> QuestBuilder {
        let mut builder = QuestBuilder::new(10);
        builder
            .set_name("Wolf Hunt")
            .set_description("Thin out the wolves near the village.")
            .set_receive_method(GrantMethod::Automatic)
            .add_prerequisite(Prerequisite::reached_level(5))
            .add_reward(Reward::gold(100))
            .add_reward(Reward::exp(250));
        builder
    }

    #[test]
    fn test_duplicate_objective_is_rejected() {
        let mut builder = wolf_hunt();
        builder
            .add_objective("kill", "Kill wolves", 1, 100, 200, ObjectiveKind::kill(3, &["wolf"]))
            .unwrap();

        let result =
            builder.add_objective("kill", "Other", 2, 0, 0, ObjectiveKind::collect(501, 2));
        assert!(matches!(result, Err(QuestError::DuplicateObjective { quest_id: 10, .. })));

        let quest = builder.init();
        assert_eq!(quest.objectives().len(), 1);
        let objective = quest.get_objective("kill").unwrap();
        assert_eq!(objective.description, "Kill wolves");
        assert_eq!(objective.region_id, 1);
        assert_eq!(objective.amount(), 3);
    }

    #[test]
    fn test_metadata_tooltip() {
        let quest = wolf_hunt().init();
        assert_eq!(
            quest.metadata().get_string("QSTTIP"),
            Some("N_Wolf Hunt|D_Thin out the wolves near the village.|A_|R_100 Gold, 250 Experience Points|T_0")
        );
    }

    #[test]
    fn test_subscriptions_are_deduplicated() {
        let mut builder = wolf_hunt();
        builder.add_objective("a", "", 0, 0, 0, ObjectiveKind::kill(1, &["wolf"])).unwrap();
        builder.add_objective("b", "", 0, 0, 0, ObjectiveKind::kill(2, &["fox"])).unwrap();
        builder.add_objective("c", "", 0, 0, 0, ObjectiveKind::collect(501, 2)).unwrap();

        let quest = builder.init();
        let kinds: Vec<EventKind> = quest.subscriptions().iter().copied().collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::PlayerLoggedIn,
                EventKind::CreatureKilled,
                EventKind::ItemReceived,
                EventKind::ItemRemoved,
            ]
        );
    }

    #[test]
    fn test_manual_quest_has_no_login_subscription() {
        let mut builder = QuestBuilder::new(11);
        builder.add_objective("talk", "", 0, 0, 0, ObjectiveKind::talk("Duncan")).unwrap();

        let quest = builder.init();
        assert_eq!(quest.grant_method(), GrantMethod::Manual);
        assert!(quest.cancelable());
        assert!(!quest.subscriptions().contains(&EventKind::PlayerLoggedIn));
        assert!(quest.subscriptions().contains(&EventKind::NpcTalked));
    }

    #[test]
    fn test_quest_from_toml() {
        let raw: RawQuestFile = toml::from_str(
            r#"
[quest]
id = 20
name = "Wool Gathering"
description = "Bring wool to Deian."
receive = "auto"
cancelable = false

[[quest.prerequisites]]
type = "completed"
quest_id = 10

[[quest.objectives]]
ident = "collect_wool"
type = "collect"
item_id = 60009
amount = 5
description = "Collect 5 wool"

[[quest.objectives]]
ident = "collect_wool"
type = "talk"
npc = "Deian"

[[quest.objectives]]
ident = "talk_deian"
type = "talk"
npc = "Deian"
region = 1
x = 27953
y = 42287

[[quest.rewards]]
type = "exp"
amount = 100
"#,
        )
        .unwrap();

        let quest = QuestDefinition::from_raw(&raw.quest).unwrap();
        assert_eq!(quest.id(), 20);
        assert!(quest.is_automatic());
        assert!(!quest.cancelable());
        assert_eq!(quest.prerequisites(), &[Prerequisite::completed(10)]);

        // Duplicate ident skipped, order kept
        let idents: Vec<&str> = quest.objectives().iter().map(|o| o.ident.as_str()).collect();
        assert_eq!(idents, vec!["collect_wool", "talk_deian"]);
        assert_eq!(quest.objectives()[1].x, 27953);
        assert_eq!(quest.rewards(), &[Reward::exp(100)]);
    }

    #[test]
    fn test_quest_without_objectives_fails() {
        let raw: RawQuestFile = toml::from_str(
            r#"
[quest]
id = 30
name = "Empty"
"#,
        )
        .unwrap();

        assert!(matches!(
            QuestDefinition::from_raw(&raw.quest),
            Err(QuestError::NoObjectives(30))
        ));
    }
}
