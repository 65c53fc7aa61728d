//! Fixture map and deck content for tests and local runs.

use crate::cards::{Demand, DemandCard};
use crate::map::{City, CitySize, GridMap, Milepost, PointId, Terrain};

/// A 12x12 map with three major cities, four supply cities, a mountain band,
/// and an impassable eastern coast.
pub fn demo_map() -> GridMap {
    let rows = 12u16;
    let cols = 12u16;
    let mut posts = Vec::with_capacity((rows * cols) as usize);

    for row in 0..rows {
        for col in 0..cols {
            let id = PointId::new(row, col);
            let terrain = if col == 11 {
                Terrain::Water
            } else if (6..=7).contains(&row) && col <= 2 {
                Terrain::Mountain
            } else if row == 11 && col <= 1 {
                Terrain::Alpine
            } else {
                Terrain::Clear
            };
            posts.push(Milepost { id, terrain, city: city_at(row, col) });
        }
    }
    GridMap::new(rows, cols, posts)
}

fn city_at(row: u16, col: u16) -> Option<City> {
    let city = match (row, col) {
        (3, 3) => City {
            name: "Metro".into(),
            size: CitySize::Major,
            available_loads: vec!["steel".into()],
        },
        (3, 9) => City {
            name: "Harborview".into(),
            size: CitySize::Major,
            available_loads: vec!["fish".into()],
        },
        (9, 6) => City {
            name: "Junction".into(),
            size: CitySize::Major,
            available_loads: vec![],
        },
        (5, 5) => City {
            name: "Vineridge".into(),
            size: CitySize::Small,
            available_loads: vec!["wine".into()],
        },
        (7, 4) => City {
            name: "Coalton".into(),
            size: CitySize::Small,
            available_loads: vec!["coal".into()],
        },
        (8, 8) => City {
            name: "Oilport".into(),
            size: CitySize::Medium,
            available_loads: vec!["oil".into()],
        },
        (2, 6) => City {
            name: "Millbrook".into(),
            size: CitySize::Small,
            available_loads: vec!["grain".into()],
        },
        _ => return None,
    };
    Some(city)
}

/// Demand cards matching the demo map's cities and resources.
pub fn demo_demand_cards() -> Vec<DemandCard> {
    fn demand(city: &str, resource: &str, payment: u64) -> Demand {
        Demand { city: city.into(), resource: resource.into(), payment }
    }

    vec![
        DemandCard::new(1, vec![demand("Metro", "wine", 28), demand("Junction", "oil", 22)]),
        DemandCard::new(2, vec![demand("Harborview", "coal", 25), demand("Metro", "grain", 18)]),
        DemandCard::new(3, vec![demand("Junction", "fish", 30), demand("Metro", "oil", 24)]),
        DemandCard::new(4, vec![demand("Harborview", "steel", 26), demand("Junction", "wine", 20)]),
        DemandCard::new(5, vec![demand("Metro", "coal", 21), demand("Harborview", "grain", 23)]),
        DemandCard::new(6, vec![demand("Junction", "steel", 27), demand("Oilport", "grain", 15)]),
        DemandCard::new(7, vec![demand("Metro", "fish", 32), demand("Coalton", "steel", 16)]),
        DemandCard::new(8, vec![demand("Harborview", "oil", 29), demand("Vineridge", "fish", 14)]),
        DemandCard::new(9, vec![demand("Junction", "coal", 19), demand("Metro", "steel", 17)]),
        DemandCard::new(10, vec![demand("Harborview", "wine", 31), demand("Junction", "grain", 18)]),
        DemandCard::new(11, vec![demand("Millbrook", "oil", 20), demand("Metro", "grain", 22)]),
        DemandCard::new(12, vec![demand("Oilport", "wine", 24), demand("Harborview", "fish", 13)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_map_has_three_major_cities() {
        let map = demo_map();
        let majors: Vec<String> = map
            .major_cities()
            .iter()
            .map(|m| m.city.as_ref().unwrap().name.clone())
            .collect();
        assert_eq!(majors.len(), 3);
        assert!(majors.contains(&"Metro".to_string()));
        assert!(majors.contains(&"Junction".to_string()));
    }

    #[test]
    fn demo_map_supplies_every_demanded_resource() {
        let map = demo_map();
        let supply = map.resource_supply();
        for card in demo_demand_cards() {
            for demand in &card.demands {
                assert!(
                    supply.contains_key(&demand.resource),
                    "no supply for {}",
                    demand.resource
                );
            }
        }
    }
}
