use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A character record from the external catalog. Only used to enrich
/// sessions; never persisted as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: String,
    pub image: String,
    pub url: String,
}

impl Character {
    pub fn age(&self) -> &'static str {
        derive_age(&self.species)
    }
}

/// The catalog has no ages, so one is derived from the species.
/// Species outside the table fall through to "Unknown".
pub fn derive_age(species: &str) -> &'static str {
    match species {
        "Human" => "Adult",
        "Alien" => "Unknown",
        "Robot" => "N/A",
        "Humanoid" => "Adult",
        "Animal" => "Adult",
        "Mythological Creature" => "Ancient",
        "Disease" => "N/A",
        "Cronenberg" => "Unknown",
        "Poopybutthole" => "Unknown",
        _ => "Unknown",
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CharacterPageInfo {
    pub next: Option<String>,
}

/// One page of the catalog's character listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CharacterPage {
    pub info: CharacterPageInfo,
    pub results: Vec<Character>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_species_map_to_documented_ages() {
        let table = [
            ("Human", "Adult"),
            ("Alien", "Unknown"),
            ("Robot", "N/A"),
            ("Humanoid", "Adult"),
            ("Animal", "Adult"),
            ("Mythological Creature", "Ancient"),
            ("Disease", "N/A"),
            ("Cronenberg", "Unknown"),
            ("Poopybutthole", "Unknown"),
        ];
        for (species, age) in table {
            assert_eq!(derive_age(species), age, "species {species}");
        }
    }

    #[test]
    fn species_match_is_case_sensitive() {
        assert_eq!(derive_age("human"), "Unknown");
        assert_eq!(derive_age(""), "Unknown");
    }

    #[test]
    fn decodes_catalog_payload() {
        let payload = r#"{
            "id": 1,
            "name": "Rick Sanchez",
            "status": "Alive",
            "species": "Human",
            "type": "",
            "gender": "Male",
            "origin": {"name": "Earth (C-137)", "url": ""},
            "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
            "episode": [],
            "url": "https://rickandmortyapi.com/api/character/1",
            "created": "2017-11-04T18:48:46.250Z"
        }"#;

        let character: Character = serde_json::from_str(payload).unwrap();
        assert_eq!(character.name, "Rick Sanchez");
        assert_eq!(character.gender, "Male");
        assert_eq!(character.age(), "Adult");
        assert!(character.image.ends_with("1.jpeg"));
    }

    proptest! {
        #[test]
        fn unrecognized_species_is_unknown(species in "[a-z]{1,24}") {
            prop_assert_eq!(derive_age(&species), "Unknown");
        }

        #[test]
        fn derive_age_is_deterministic(species in ".*") {
            prop_assert_eq!(derive_age(&species), derive_age(&species));
        }
    }
}
