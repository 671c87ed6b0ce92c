use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::ResourceKind;
use crate::ident::extract_id;

/// A `{ name, url }` reference as returned by every listing endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl IndexEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Numeric id embedded in `url` after `kind`'s path segment, `0` if absent.
    pub fn id_for(&self, kind: ResourceKind) -> u32 {
        extract_id(&self.url, kind.segment())
    }
}

/// Body of `GET /{kind}?limit=N`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IndexListing {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub results: Vec<IndexEntry>,
}

/// Identity of a fetched record: numeric id where known, else name.
pub trait Identified {
    fn id(&self) -> u32;
    fn name(&self) -> &str;

    /// Extra labels the search filter matches against (e.g. type names).
    fn labels(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// A detail record that lives under one resource kind of the API.
pub trait Record: Identified + DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(from = "wire::PokemonWire")]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    pub types: Vec<String>,
    pub sprite: Option<String>,
    pub abilities: Vec<String>,
    pub height: u32,
    pub weight: u32,
    pub base_experience: u32,
    pub stats: Vec<Stat>,
    pub species: Option<IndexEntry>,
    pub is_default: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Stat {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base: u32,
}

/// A species owns one or more pokemon varieties (regional forms, megas, ...).
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(from = "wire::SpeciesWire")]
pub struct Species {
    pub id: u32,
    pub name: String,
    pub varieties: Vec<Variety>,
    pub generation: Option<IndexEntry>,
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Variety {
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub pokemon: IndexEntry,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Location {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: Option<IndexEntry>,
    #[serde(default)]
    pub areas: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Move {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub accuracy: Option<u32>,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub pp: Option<u32>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, rename = "type")]
    pub move_type: Option<IndexEntry>,
    #[serde(default)]
    pub damage_class: Option<IndexEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Generation {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub main_region: Option<IndexEntry>,
    #[serde(default)]
    pub pokemon_species: Vec<IndexEntry>,
    #[serde(default)]
    pub moves: Vec<IndexEntry>,
}

/// One species and the forms materialized for it, sorted by pokemon id.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GroupedResult<M> {
    pub group_id: u32,
    pub group_name: String,
    pub members: Vec<M>,
}

impl<M: Identified> GroupedResult<M> {
    /// Sort key of the group: the id of its lowest member.
    pub fn sort_key(&self) -> u32 {
        self.members.first().map_or(0, |m| m.id())
    }
}

macro_rules! record_kind {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: ResourceKind = $kind;
        }
    };
}

impl Identified for Pokemon {
    fn id(&self) -> u32 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn labels(&self) -> Vec<&str> {
        self.types.iter().map(String::as_str).collect()
    }
}

impl Identified for Species {
    fn id(&self) -> u32 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Identified for Location {
    fn id(&self) -> u32 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn labels(&self) -> Vec<&str> {
        self.region.iter().map(|r| r.name.as_str()).collect()
    }
}

impl Identified for Move {
    fn id(&self) -> u32 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn labels(&self) -> Vec<&str> {
        self.move_type
            .iter()
            .chain(self.damage_class.iter())
            .map(|e| e.name.as_str())
            .collect()
    }
}

impl Identified for Generation {
    fn id(&self) -> u32 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn labels(&self) -> Vec<&str> {
        self.main_region.iter().map(|r| r.name.as_str()).collect()
    }
}

record_kind!(Pokemon, ResourceKind::Pokemon);
record_kind!(Species, ResourceKind::PokemonSpecies);
record_kind!(Location, ResourceKind::Location);
record_kind!(Move, ResourceKind::Move);
record_kind!(Generation, ResourceKind::Generation);

/// Raw API shapes, flattened into the public records above.
mod wire {
    use super::{IndexEntry, Pokemon, Species, Stat, Variety};
    use serde::Deserialize;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    pub struct PokemonWire {
        id: u32,
        name: String,
        types: Vec<TypeSlot>,
        sprites: Sprites,
        abilities: Vec<AbilitySlot>,
        height: u32,
        weight: u32,
        base_experience: Option<u32>,
        stats: Vec<StatWire>,
        species: Option<IndexEntry>,
        is_default: bool,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct TypeSlot {
        slot: u32,
        #[serde(rename = "type")]
        type_field: IndexEntry,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct AbilitySlot {
        ability: IndexEntry,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Sprites {
        front_default: Option<String>,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct StatWire {
        base_stat: u32,
        stat: IndexEntry,
    }

    impl From<PokemonWire> for Pokemon {
        fn from(w: PokemonWire) -> Self {
            let mut types = w.types;
            types.sort_by_key(|t| t.slot);
            Pokemon {
                id: w.id,
                name: w.name,
                types: types.into_iter().map(|t| t.type_field.name).collect(),
                sprite: w.sprites.front_default,
                abilities: w.abilities.into_iter().map(|a| a.ability.name).collect(),
                height: w.height,
                weight: w.weight,
                base_experience: w.base_experience.unwrap_or(0),
                stats: w
                    .stats
                    .into_iter()
                    .map(|s| Stat {
                        name: s.stat.name,
                        base: s.base_stat,
                    })
                    .collect(),
                species: w.species,
                is_default: w.is_default,
            }
        }
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    pub struct SpeciesWire {
        id: u32,
        name: String,
        varieties: Vec<Variety>,
        generation: Option<IndexEntry>,
        flavor_text_entries: Vec<FlavorText>,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct FlavorText {
        flavor_text: String,
        language: IndexEntry,
    }

    impl From<SpeciesWire> for Species {
        fn from(w: SpeciesWire) -> Self {
            let description = w
                .flavor_text_entries
                .iter()
                .find(|ft| ft.language.name == "en")
                .map(|ft| ft.flavor_text.replace(['\n', '\u{c}'], " "))
                .unwrap_or_else(|| "No description available.".to_string());
            Species {
                id: w.id,
                name: w.name,
                varieties: w.varieties,
                generation: w.generation,
                description,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pokemon_flattens_api_shape() {
        let body = json!({
            "id": 6,
            "name": "charizard",
            "base_experience": 267,
            "height": 17,
            "weight": 905,
            "is_default": true,
            "species": { "name": "charizard", "url": "https://pokeapi.co/api/v2/pokemon-species/6/" },
            "sprites": { "front_default": null },
            "types": [
                { "slot": 2, "type": { "name": "flying", "url": "https://pokeapi.co/api/v2/type/3/" } },
                { "slot": 1, "type": { "name": "fire", "url": "https://pokeapi.co/api/v2/type/10/" } }
            ],
            "abilities": [
                { "ability": { "name": "blaze", "url": "https://pokeapi.co/api/v2/ability/66/" }, "is_hidden": false, "slot": 1 }
            ],
            "stats": [
                { "base_stat": 78, "effort": 0, "stat": { "name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/" } }
            ]
        });
        let p: Pokemon = serde_json::from_value(body).unwrap();
        assert_eq!(p.id, 6);
        assert_eq!(p.types, vec!["fire", "flying"]);
        assert_eq!(p.sprite, None);
        assert_eq!(p.abilities, vec!["blaze"]);
        assert_eq!(p.stats, vec![Stat { name: "hp".into(), base: 78 }]);
        assert_eq!(p.labels(), vec!["fire", "flying"]);
    }

    #[test]
    fn null_base_experience_defaults_to_zero() {
        let p: Pokemon =
            serde_json::from_value(json!({ "id": 10001, "name": "deoxys-attack", "base_experience": null }))
                .unwrap();
        assert_eq!(p.base_experience, 0);
    }

    #[test]
    fn species_picks_english_flavor_text() {
        let body = json!({
            "id": 25,
            "name": "pikachu",
            "varieties": [
                { "is_default": true, "pokemon": { "name": "pikachu", "url": "https://pokeapi.co/api/v2/pokemon/25/" } }
            ],
            "flavor_text_entries": [
                { "flavor_text": "ピカチュウ", "language": { "name": "ja", "url": "" } },
                { "flavor_text": "When several of\nthese POKéMON\u{c}gather", "language": { "name": "en", "url": "" } }
            ]
        });
        let s: Species = serde_json::from_value(body).unwrap();
        assert_eq!(s.varieties.len(), 1);
        assert_eq!(s.description, "When several of these POKéMON gather");
    }

    #[test]
    fn move_reads_nullable_fields() {
        let m: Move = serde_json::from_value(json!({
            "id": 14,
            "name": "swords-dance",
            "power": null,
            "accuracy": null,
            "pp": 20,
            "type": { "name": "normal", "url": "https://pokeapi.co/api/v2/type/1/" },
            "damage_class": { "name": "status", "url": "https://pokeapi.co/api/v2/move-damage-class/1/" }
        }))
        .unwrap();
        assert_eq!(m.power, None);
        assert_eq!(m.pp, Some(20));
        assert_eq!(m.labels(), vec!["normal", "status"]);
    }

    #[test]
    fn group_sort_key_is_first_member_id() {
        let group = GroupedResult {
            group_id: 19,
            group_name: "rattata".into(),
            members: vec![
                Pokemon { id: 19, ..Default::default() },
                Pokemon { id: 10091, ..Default::default() },
            ],
        };
        assert_eq!(group.sort_key(), 19);
    }
}
