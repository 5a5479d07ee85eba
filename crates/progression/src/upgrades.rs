//! Tech tree: prerequisite-gated upgrade nodes with geometric cost growth.
//!
//! Nodes come from a static catalog and are validated once at construction
//! (unknown prerequisites and cycles are fatal). After that the only mutation is
//! [`UpgradeGraph::purchase`], which either applies completely (debit, level,
//! unlock cascade) or not at all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PurchaseDenied};
use crate::events::GameEvent;
use crate::ledger::ResourceLedger;
use crate::persistence::NodeSnapshot;
use crate::stats::StatKey;

/// Shop grouping for an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeCategory {
    Hull,
    Propulsion,
    Systems,
    Weapons,
}

/// Static catalog record for one upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeNodeDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: UpgradeCategory,
    /// Stat this upgrade multiplies.
    pub stat: StatKey,
    pub max_level: u32,
    pub base_cost: u64,
    pub cost_multiplier: f64,
    pub effect_per_level: f32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl UpgradeNodeDef {
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUpgrade {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.max_level == 0 {
            return Err(invalid("max_level must be at least 1"));
        }
        if !self.cost_multiplier.is_finite() || self.cost_multiplier <= 0.0 {
            return Err(invalid("cost_multiplier must be a positive number"));
        }
        if !self.effect_per_level.is_finite() {
            return Err(invalid("effect_per_level must be finite"));
        }
        if 1.0 + self.effect_per_level * self.max_level as f32 <= 0.0 {
            return Err(invalid("effect at max_level must stay above zero"));
        }
        Ok(())
    }
}

/// Runtime state of one catalog node.
#[derive(Debug, Clone)]
pub struct UpgradeNode {
    def: UpgradeNodeDef,
    level: u32,
    unlocked: bool,
    prerequisites: Vec<usize>,
    dependents: Vec<usize>,
}

impl UpgradeNode {
    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn def(&self) -> &UpgradeNodeDef {
        &self.def
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_level(&self) -> u32 {
        self.def.max_level
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.def.max_level
    }

    /// `round(base_cost * cost_multiplier ^ level)`, where `level` is the
    /// level owned before the purchase.
    pub fn cost_at(&self, level: u32) -> u64 {
        let raw = self.def.base_cost as f64 * self.def.cost_multiplier.powi(level as i32);
        // float -> int `as` saturates at u64::MAX
        raw.round() as u64
    }

    /// `1 + effect_per_level * level`.
    pub fn effect(&self) -> f32 {
        1.0 + self.def.effect_per_level * self.level as f32
    }
}

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub id: String,
    pub level: u32,
    pub cost: u64,
    pub stat: StatKey,
    /// Combined multiplier for `stat` after the purchase.
    pub multiplier: f32,
    /// Nodes that became purchasable because of this purchase.
    pub unlocked: Vec<String>,
    pub maxed: bool,
}

/// Prerequisite DAG of upgrade nodes.
#[derive(Debug, Clone)]
pub struct UpgradeGraph {
    nodes: Vec<UpgradeNode>,
    index: HashMap<String, usize>,
}

impl UpgradeGraph {
    /// Build and validate the graph. Root nodes start unlocked; every other
    /// node starts locked until all of its prerequisites are owned.
    pub fn new(defs: Vec<UpgradeNodeDef>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            def.validate()?;
            if index.insert(def.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateUpgrade(def.id.clone()));
            }
        }

        let mut nodes: Vec<UpgradeNode> = Vec::with_capacity(defs.len());
        for def in defs {
            let mut prerequisites = Vec::with_capacity(def.prerequisites.len());
            for pre in &def.prerequisites {
                match index.get(pre) {
                    Some(&p) => prerequisites.push(p),
                    None => {
                        return Err(ConfigError::UnknownPrerequisite {
                            node: def.id.clone(),
                            prerequisite: pre.clone(),
                        })
                    }
                }
            }
            nodes.push(UpgradeNode {
                unlocked: prerequisites.is_empty(),
                def,
                level: 0,
                prerequisites,
                dependents: Vec::new(),
            });
        }

        for i in 0..nodes.len() {
            for p in nodes[i].prerequisites.clone() {
                if !nodes[p].dependents.contains(&i) {
                    nodes[p].dependents.push(i);
                }
            }
        }

        let graph = Self { nodes, index };
        if let Some(cycle) = graph.find_cycle() {
            return Err(ConfigError::PrerequisiteCycle { cycle });
        }
        log::debug!("Upgrade graph ready with {} nodes", graph.nodes.len());
        Ok(graph)
    }

    /// Depth-first search over prerequisite edges; returns the ids along the
    /// first cycle found, closed with its starting id.
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(
            graph: &UpgradeGraph,
            node: usize,
            marks: &mut [Mark],
            path: &mut Vec<usize>,
        ) -> Option<Vec<String>> {
            marks[node] = Mark::InProgress;
            path.push(node);
            for &pre in &graph.nodes[node].prerequisites {
                match marks[pre] {
                    Mark::InProgress => {
                        let start = path.iter().position(|&n| n == pre).unwrap_or(0);
                        let mut cycle: Vec<String> = path[start..]
                            .iter()
                            .map(|&n| graph.nodes[n].def.id.clone())
                            .collect();
                        cycle.push(graph.nodes[pre].def.id.clone());
                        return Some(cycle);
                    }
                    Mark::Unvisited => {
                        if let Some(cycle) = visit(graph, pre, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }
            path.pop();
            marks[node] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut path = Vec::new();
        for start in 0..self.nodes.len() {
            if marks[start] == Mark::Unvisited {
                if let Some(cycle) = visit(self, start, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&UpgradeNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Nodes in catalog order.
    pub fn nodes(&self) -> impl Iterator<Item = &UpgradeNode> {
        self.nodes.iter()
    }

    /// Cost of buying `id` when it currently sits at `level`.
    pub fn cost(&self, id: &str, level: u32) -> Option<u64> {
        self.node(id).map(|n| n.cost_at(level))
    }

    /// Cost of the next level, or `None` for unknown or maxed nodes.
    pub fn next_cost(&self, id: &str) -> Option<u64> {
        self.node(id)
            .filter(|n| !n.is_maxed())
            .map(|n| n.cost_at(n.level))
    }

    pub fn effect(&self, id: &str) -> Option<f32> {
        self.node(id).map(UpgradeNode::effect)
    }

    /// Product of the effects of every node driving `stat`.
    pub fn stat_multiplier(&self, stat: StatKey) -> f32 {
        self.nodes
            .iter()
            .filter(|n| n.def.stat == stat)
            .map(UpgradeNode::effect)
            .product()
    }

    /// Every stat the catalog drives with its current multiplier, in catalog order.
    pub fn multipliers(&self) -> Vec<(StatKey, f32)> {
        let mut out: Vec<(StatKey, f32)> = Vec::new();
        for node in &self.nodes {
            if !out.iter().any(|(s, _)| *s == node.def.stat) {
                out.push((node.def.stat, self.stat_multiplier(node.def.stat)));
            }
        }
        out
    }

    /// Check every purchase precondition. Returns the cost on success.
    pub fn check_purchase(&self, id: &str, ledger: &ResourceLedger) -> Result<u64, PurchaseDenied> {
        let node = self
            .node(id)
            .ok_or_else(|| PurchaseDenied::UnknownUpgrade(id.to_string()))?;
        if node.is_maxed() {
            return Err(PurchaseDenied::MaxLevel(id.to_string()));
        }
        if let Some(&missing) = node.prerequisites.iter().find(|&&p| self.nodes[p].level == 0) {
            return Err(PurchaseDenied::PrerequisiteUnmet {
                id: id.to_string(),
                missing: self.nodes[missing].def.id.clone(),
            });
        }
        if !node.unlocked {
            return Err(PurchaseDenied::Locked(id.to_string()));
        }
        let cost = node.cost_at(node.level);
        if !ledger.can_afford(cost) {
            return Err(PurchaseDenied::InsufficientFunds {
                id: id.to_string(),
                cost,
                available: ledger.credits(),
            });
        }
        Ok(cost)
    }

    pub fn can_purchase(&self, id: &str, ledger: &ResourceLedger) -> bool {
        self.check_purchase(id, ledger).is_ok()
    }

    /// Buy one level of `id`.
    ///
    /// On the 0 -> 1 transition, dependents whose prerequisites are now all
    /// owned become unlocked. Nothing is bought on their behalf.
    pub fn purchase(
        &mut self,
        id: &str,
        ledger: &mut ResourceLedger,
        events: &mut Vec<GameEvent>,
    ) -> Result<PurchaseReceipt, PurchaseDenied> {
        let cost = self.check_purchase(id, ledger)?;
        let idx = self.index[id];

        ledger.debit(cost);
        self.nodes[idx].level += 1;
        let level = self.nodes[idx].level;

        let mut unlocked = Vec::new();
        if level == 1 {
            for dep in self.nodes[idx].dependents.clone() {
                if !self.nodes[dep].unlocked && self.prerequisites_owned(dep) {
                    self.nodes[dep].unlocked = true;
                    unlocked.push(self.nodes[dep].def.id.clone());
                }
            }
        }

        let stat = self.nodes[idx].def.stat;
        let maxed = self.nodes[idx].is_maxed();
        let multiplier = self.stat_multiplier(stat);
        log::info!(
            "Purchased {} level {} for {} credits ({} now x{:.2})",
            id,
            level,
            cost,
            stat,
            multiplier
        );

        events.push(GameEvent::UpgradePurchased { id: id.to_string(), level });
        if maxed {
            events.push(GameEvent::UpgradeMaxed { id: id.to_string() });
        }

        Ok(PurchaseReceipt {
            id: id.to_string(),
            level,
            cost,
            stat,
            multiplier,
            unlocked,
            maxed,
        })
    }

    fn prerequisites_owned(&self, idx: usize) -> bool {
        self.nodes[idx]
            .prerequisites
            .iter()
            .all(|&p| self.nodes[p].level > 0)
    }

    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.nodes
            .iter()
            .map(|n| NodeSnapshot {
                id: n.def.id.clone(),
                level: n.level,
                unlocked: n.unlocked,
            })
            .collect()
    }

    /// Apply persisted levels. Unknown ids are skipped, levels are clamped to
    /// `max_level`, and unlock flags are re-derived from prerequisites so the
    /// unlock invariant holds whatever the snapshot says.
    pub fn restore(&mut self, snapshot: &[NodeSnapshot]) {
        for node in &mut self.nodes {
            node.level = 0;
        }
        for saved in snapshot {
            match self.index.get(&saved.id) {
                Some(&i) => {
                    let max = self.nodes[i].def.max_level;
                    if saved.level > max {
                        log::warn!(
                            "Clamping saved level {} of {} to {}",
                            saved.level,
                            saved.id,
                            max
                        );
                    }
                    self.nodes[i].level = saved.level.min(max);
                }
                None => log::warn!("Ignoring saved state for unknown upgrade '{}'", saved.id),
            }
        }
        for i in 0..self.nodes.len() {
            self.nodes[i].unlocked = self.prerequisites_owned(i);
        }
        for saved in snapshot {
            if let Some(node) = self.node(&saved.id) {
                if node.unlocked != saved.unlocked {
                    log::warn!(
                        "Saved unlock flag for '{}' disagrees with prerequisites; using {}",
                        saved.id,
                        node.unlocked
                    );
                }
            }
        }
    }
}
