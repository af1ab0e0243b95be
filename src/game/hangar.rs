//! Hangar: the ship catalog and owned-ship operations.
//!
//! The hangar holds the blueprint list loaded from the catalog. A purchase
//! only debits the character once every check has passed, so a failed
//! purchase leaves the wallet untouched. Persisting the results is the
//! caller's job.

use rand::Rng;

use crate::game::errors::GameError;
use crate::game::types::{CargoItem, CharacterRecord, ShipBlueprint, ShipRecord};

/// Attempts at finding a plate name the owner does not already use.
const PLATE_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct Hangar {
    blueprints: Vec<ShipBlueprint>,
}

impl Hangar {
    /// Blueprints are listed cheapest first.
    pub fn new(mut blueprints: Vec<ShipBlueprint>) -> Self {
        blueprints.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.model.cmp(&b.model)));
        Self { blueprints }
    }

    pub fn blueprints(&self) -> &[ShipBlueprint] {
        &self.blueprints
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    /// Case-insensitive lookup by model name.
    pub fn find_blueprint(&self, model: &str) -> Option<&ShipBlueprint> {
        let wanted = model.trim();
        self.blueprints
            .iter()
            .find(|bp| bp.model.eq_ignore_ascii_case(wanted))
    }

    /// Buy a ship of `model` for `character`. The new ship becomes the
    /// character's current ship. `taken` lists names the owner already uses.
    pub fn purchase<R: Rng + ?Sized>(
        &self,
        character: &mut CharacterRecord,
        model: &str,
        taken: &[String],
        rng: &mut R,
    ) -> Result<ShipRecord, GameError> {
        let blueprint = self
            .find_blueprint(model)
            .ok_or_else(|| GameError::NotFound(format!("ship model: {}", model.trim())))?;
        let name = unused_plate_name(&character.name, taken, rng)?;
        character.subtract_credits(blueprint.cost)?;

        let ship = ShipRecord::new(&character.owner_id, &blueprint.model, &name);
        character.current_ship = Some(ship.id);
        character.touch();
        Ok(ship)
    }

    /// Refund `ship`'s blueprint cost to `character` and unboard it if it was
    /// the current ship. Returns the amount refunded. A ship whose blueprint
    /// left the catalog refunds nothing.
    pub fn sell(&self, character: &mut CharacterRecord, ship: &ShipRecord) -> u64 {
        let refund = self
            .find_blueprint(&ship.blueprint)
            .map(|bp| bp.cost)
            .unwrap_or(0);
        character.add_credits(refund);
        if character.current_ship == Some(ship.id) {
            character.current_ship = None;
        }
        refund
    }

    /// Catalog listing for `ship buy` without a model.
    pub fn listing(&self) -> String {
        if self.blueprints.is_empty() {
            return "The hangar has no ships for sale.".to_string();
        }
        let mut out = vec!["Ships for sale:".to_string()];
        for bp in &self.blueprints {
            out.push(format!("  {:<16} {:>10} credits", bp.model, bp.cost));
        }
        out.join("\n")
    }
}

/// Plate-style name: the first three letters of `owner_name` uppercased
/// (padded with `X`) followed by three random digits, e.g. `ZED-042`.
pub fn plate_name<R: Rng + ?Sized>(owner_name: &str, rng: &mut R) -> String {
    let mut letters: String = owner_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while letters.len() < 3 {
        letters.push('X');
    }
    format!("{}-{:03}", letters, rng.gen_range(0..1000))
}

fn unused_plate_name<R: Rng + ?Sized>(
    owner_name: &str,
    taken: &[String],
    rng: &mut R,
) -> Result<String, GameError> {
    for _ in 0..PLATE_ATTEMPTS {
        let name = plate_name(owner_name, rng);
        if !taken.iter().any(|t| t.eq_ignore_ascii_case(&name)) {
            return Ok(name);
        }
    }
    Err(GameError::AlreadyExists(
        "no free plate name is left for another ship; rename or sell one first".to_string(),
    ))
}

pub fn blueprint_info_card(bp: &ShipBlueprint) -> String {
    [
        format!("Model:            {}", bp.model),
        format!("Cost:             {} credits", bp.cost),
        format!("Mass:             {} t", bp.mass),
        format!("Cargo capacity:   {} t", bp.cargo_capacity),
        format!("Fuel capacity:    {}", bp.fuel_capacity),
        format!(
            "Hardpoints:       {} weapon, {} auxiliary",
            bp.weapon_hardpoints, bp.aux_hardpoints
        ),
        format!("Description:      {}", bp.description),
    ]
    .join("\n")
}

impl ShipRecord {
    /// Whether `item` fits on top of everything already in the hold.
    pub fn can_fit_cargo(&self, item: &CargoItem, blueprint: &ShipBlueprint) -> bool {
        self.cargo_mass().saturating_add(item.mass()) <= blueprint.cargo_capacity
    }

    pub fn info_card(&self, blueprint: Option<&ShipBlueprint>) -> String {
        let mut lines = vec![
            format!("Name:             {}", self.name),
            format!("Model:            {}", self.blueprint),
            format!("Status:           {}", self.flight_status.label()),
        ];
        match blueprint {
            Some(bp) => lines.push(format!(
                "Cargo:            {}/{} t",
                self.cargo_mass(),
                bp.cargo_capacity
            )),
            None => lines.push(format!("Cargo:            {} t", self.cargo_mass())),
        }
        for item in &self.cargo {
            lines.push(format!("  - {} ({} t)", item.label(), item.mass()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::BLUEPRINT_SCHEMA_VERSION;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sparrow() -> ShipBlueprint {
        ShipBlueprint {
            model: "Sparrow".into(),
            cost: 50_000,
            mass: 40,
            cargo_capacity: 20,
            fuel_capacity: 100,
            weapon_hardpoints: 1,
            aux_hardpoints: 1,
            description: "A small courier.".into(),
            schema_version: BLUEPRINT_SCHEMA_VERSION,
        }
    }

    #[test]
    fn plate_names_pad_and_uppercase() {
        let mut rng = StdRng::seed_from_u64(1);
        let name = plate_name("jo", &mut rng);
        assert!(name.starts_with("JOX-"), "{}", name);
        assert_eq!(name.len(), 7);
        assert!(name[4..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn purchase_boards_new_ship() {
        let hangar = Hangar::new(vec![sparrow()]);
        let mut c = CharacterRecord::new("p1", "Zed", 60_000);
        let mut rng = StdRng::seed_from_u64(3);
        let ship = hangar.purchase(&mut c, "sparrow", &[], &mut rng).expect("buy");
        assert_eq!(c.credits, 10_000);
        assert_eq!(c.current_ship, Some(ship.id));
        assert_eq!(ship.blueprint, "Sparrow");
        assert!(ship.name.starts_with("ZED-"));
    }

    #[test]
    fn unknown_model_costs_nothing() {
        let hangar = Hangar::new(vec![sparrow()]);
        let mut c = CharacterRecord::new("p1", "Zed", 60_000);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            hangar.purchase(&mut c, "Galleon", &[], &mut rng),
            Err(GameError::NotFound(_))
        ));
        assert_eq!(c.credits, 60_000);
    }

    #[test]
    fn exhausted_plates_fail_without_charging() {
        let hangar = Hangar::new(vec![sparrow()]);
        let mut c = CharacterRecord::new("p1", "Zed", 60_000);
        let taken: Vec<String> = (0..1000).map(|n| format!("ZED-{:03}", n)).collect();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            hangar.purchase(&mut c, "Sparrow", &taken, &mut rng),
            Err(GameError::AlreadyExists(_))
        ));
        assert_eq!(c.credits, 60_000);
        assert!(c.current_ship.is_none());
    }

    #[test]
    fn sell_refunds_and_unboards() {
        let hangar = Hangar::new(vec![sparrow()]);
        let mut c = CharacterRecord::new("p1", "Zed", 50_000);
        let mut rng = StdRng::seed_from_u64(3);
        let ship = hangar.purchase(&mut c, "Sparrow", &[], &mut rng).expect("buy");
        assert_eq!(c.credits, 0);
        assert_eq!(hangar.sell(&mut c, &ship), 50_000);
        assert_eq!(c.credits, 50_000);
        assert!(c.current_ship.is_none());
    }

    #[test]
    fn cargo_fit_sums_the_whole_hold() {
        let bp = sparrow();
        let mut ship = ShipRecord::new("p1", "Sparrow", "ZED-001");
        let ore = |mass| CargoItem::Goods {
            name: "Ore".into(),
            mass,
        };
        assert!(ship.can_fit_cargo(&ore(20), &bp));
        ship.cargo.push(ore(12));
        ship.cargo.push(CargoItem::Weapon {
            blueprint: "Pulse Laser".into(),
            bonus_damage: 1,
            mass: 5,
        });
        assert_eq!(ship.cargo_mass(), 17);
        assert!(ship.can_fit_cargo(&ore(3), &bp));
        assert!(!ship.can_fit_cargo(&ore(4), &bp));
        assert!(ship.info_card(Some(&bp)).contains("Cargo:            17/20 t"));
    }
}
