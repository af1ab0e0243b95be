//! Character wallet, mission binding and the character sheet.

use crate::game::errors::GameError;
use crate::game::types::{CharacterRecord, MissionInstance, ShipRecord};

impl CharacterRecord {
    pub fn can_afford(&self, amount: u64) -> bool {
        self.credits >= amount
    }

    /// Debit credits. Fails without touching the balance when it would go negative.
    pub fn subtract_credits(&mut self, amount: u64) -> Result<(), GameError> {
        if !self.can_afford(amount) {
            return Err(GameError::InsufficientFunds {
                cost: amount,
                balance: self.credits,
            });
        }
        self.credits -= amount;
        self.touch();
        Ok(())
    }

    pub fn add_credits(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount);
        self.touch();
    }

    /// Replace the current mission wholesale. Returns the superseded instance.
    pub fn bind_mission(&mut self, mission: MissionInstance) -> Option<MissionInstance> {
        self.touch();
        self.current_mission.replace(mission)
    }

    pub fn current_mission_template(&self) -> Option<&str> {
        self.current_mission.as_ref().map(|m| m.template.as_str())
    }

    /// Plain-text character sheet. `ship` is the currently boarded ship, if any.
    pub fn info_card(&self, ship: Option<&ShipRecord>) -> String {
        let mut lines = vec![
            format!("Name:             {}", self.name),
            format!("Level:            {}", self.level()),
            format!("XP:               {}", self.xp),
            format!("Credits:          {}", self.credits),
        ];
        match &self.current_mission {
            Some(m) => lines.push(format!(
                "Current mission:  {} ({}%)",
                m.template,
                m.progress_percent()
            )),
            None => lines.push("Current mission:  awaiting orders".to_string()),
        }
        if let Some(ship) = ship {
            lines.push(format!("Currently aboard your ship '{}'", ship.name));
        }
        lines.join("\n")
    }
}
