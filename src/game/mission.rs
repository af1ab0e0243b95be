//! Mission templates, per-character progress and next-mission selection.
//!
//! Templates are loaded once into a [`MissionTree`], an immutable forest with a
//! parent -> children index built at load time. A character carries a
//! [`MissionInstance`] that the tick driver advances by one tick per period.
//! Completion is reported by the return value of [`MissionInstance::advance`]
//! rather than through callbacks, so the caller decides what happens next
//! (reward, then [`MissionTree::select_next`]).

use std::collections::{HashMap, HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::errors::GameError;
use crate::game::types::{MissionInstance, MissionTemplate};

/// Outcome of one `advance()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStatus {
    /// Still short of the required ticks.
    Active,
    /// This tick crossed the threshold. Reported exactly once per instance.
    Completed,
    /// The instance was already complete; progress was left alone.
    AlreadyComplete,
}

impl MissionInstance {
    /// Bind a fresh instance of `template` with progress reset to zero.
    pub fn start(template: &MissionTemplate) -> Self {
        Self {
            template: template.name.clone(),
            required_ticks: template.time_required,
            progress: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.required_ticks
    }

    /// Advance by exactly one tick. COMPLETE is terminal.
    pub fn advance(&mut self) -> MissionStatus {
        if self.is_complete() {
            return MissionStatus::AlreadyComplete;
        }
        self.progress += 1;
        if self.is_complete() {
            MissionStatus::Completed
        } else {
            MissionStatus::Active
        }
    }

    /// `floor(progress * 100 / required)`.
    pub fn progress_percent(&self) -> u32 {
        if self.required_ticks == 0 {
            return 100;
        }
        (u64::from(self.progress) * 100 / u64::from(self.required_ticks)) as u32
    }
}

/// Inclusive reward bounds: `[floor(base * 0.9), floor(base * 1.1)]`.
pub fn reward_bounds(base: u32) -> (u64, u64) {
    let base = u64::from(base);
    (base * 9 / 10, base * 11 / 10)
}

/// Experience award for finishing `template`, uniform over [`reward_bounds`].
pub fn roll_reward<R: Rng + ?Sized>(template: &MissionTemplate, rng: &mut R) -> u64 {
    let (low, high) = reward_bounds(template.xp_reward);
    rng.gen_range(low..=high)
}

/// Briefing shown when a mission starts.
pub fn mission_info_card(template: &MissionTemplate) -> String {
    [
        format!("Name:         {}", template.name),
        format!("Description:  {}", template.description),
        format!("Tier:         {}", template.tier),
        format!("Base XP:      {}", template.xp_reward),
        format!("ETC:          {} seconds", template.time_required),
    ]
    .join("\n")
}

/// Immutable forest of mission templates keyed by name.
#[derive(Debug, Clone)]
pub struct MissionTree {
    templates: HashMap<String, MissionTemplate>,
    roots: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl MissionTree {
    /// Build and validate the tree. Rejects an empty set, duplicate names,
    /// zero-tick templates, dangling parent links and anything not reachable
    /// from a root (which is how a cycle shows up).
    pub fn from_templates(templates: Vec<MissionTemplate>) -> Result<Self, GameError> {
        if templates.is_empty() {
            return Err(GameError::EmptyCatalog("mission"));
        }

        let mut by_name: HashMap<String, MissionTemplate> = HashMap::new();
        for template in templates {
            if template.time_required == 0 {
                return Err(GameError::ZeroRequiredTicks(template.name));
            }
            if by_name.contains_key(&template.name) {
                return Err(GameError::DuplicateTemplate(template.name));
            }
            by_name.insert(template.name.clone(), template);
        }

        let mut roots: Vec<&MissionTemplate> = Vec::new();
        let mut children: HashMap<String, Vec<&MissionTemplate>> = HashMap::new();
        for template in by_name.values() {
            match &template.parent {
                None => roots.push(template),
                Some(parent) if by_name.contains_key(parent) => {
                    children.entry(parent.clone()).or_default().push(template);
                }
                Some(_) => return Err(GameError::TemplateCycle(template.name.clone())),
            }
        }

        let sort_key = |t: &&MissionTemplate| (t.ordinal, t.name.clone());
        roots.sort_by_key(sort_key);
        let roots: Vec<String> = roots.into_iter().map(|t| t.name.clone()).collect();
        let children: HashMap<String, Vec<String>> = children
            .into_iter()
            .map(|(parent, mut kids)| {
                kids.sort_by_key(sort_key);
                (parent, kids.into_iter().map(|t| t.name.clone()).collect())
            })
            .collect();

        // Every template must hang off a root; an unreachable one sits on a loop.
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = roots.iter().map(String::as_str).collect();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(kids) = children.get(name) {
                queue.extend(kids.iter().map(String::as_str));
            }
        }
        if seen.len() != by_name.len() {
            let mut stranded: Vec<&String> = by_name
                .keys()
                .filter(|name| !seen.contains(name.as_str()))
                .collect();
            stranded.sort();
            let first = stranded
                .first()
                .map(|name| name.to_string())
                .unwrap_or_default();
            return Err(GameError::TemplateCycle(first));
        }

        Ok(Self {
            templates: by_name,
            roots,
            children,
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MissionTemplate> {
        self.templates.get(name)
    }

    pub fn roots(&self) -> Vec<&MissionTemplate> {
        self.resolve(&self.roots)
    }

    pub fn children_of(&self, name: &str) -> Vec<&MissionTemplate> {
        self.children
            .get(name)
            .map(|kids| self.resolve(kids))
            .unwrap_or_default()
    }

    /// Children of the completed mission, or the root set for a leaf, an
    /// unknown template, or a character that has never had a mission.
    pub fn candidates_after(&self, completed: Option<&str>) -> Vec<&MissionTemplate> {
        if let Some(name) = completed {
            let kids = self.children_of(name);
            if !kids.is_empty() {
                return kids;
            }
        }
        self.roots()
    }

    /// Uniform random pick from [`candidates_after`](Self::candidates_after).
    pub fn select_next<R: Rng + ?Sized>(
        &self,
        completed: Option<&str>,
        rng: &mut R,
    ) -> Option<&MissionTemplate> {
        self.candidates_after(completed).choose(rng).copied()
    }

    fn resolve(&self, names: &[String]) -> Vec<&MissionTemplate> {
        names.iter().filter_map(|n| self.templates.get(n)).collect()
    }
}
