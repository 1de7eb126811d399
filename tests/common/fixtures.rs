//! Shared documents for integration tests.
use serde_json::{Value, json};

/// Two stories with titles and ratings.
pub fn stories() -> Value {
    json!({
        "stories": [
            { "title": "alpha", "rating": 45 },
            { "title": "beta", "rating": 90 }
        ]
    })
}

/// The classic selector-language sample document: a person record with
/// nested names, language skills and a list of favourite drinks.
pub fn basic() -> Value {
    json!({
        "name": {
            "first": "Lloyd",
            "last": "Hilaiel"
        },
        "favoriteColor": "yellow",
        "languagesSpoken": [
            { "lang": "Bulgarian", "level": "advanced" },
            { "lang": "English", "level": "native", "preferred": true },
            { "lang": "Spanish", "level": "beginner" }
        ],
        "seatingPreference": ["window", "aisle"],
        "drinkPreference": ["whiskey", "beer", "wine"],
        "weight": 172
    })
}

/// A document with positions, empties and mixed scalar kinds.
pub fn mixed() -> Value {
    json!({
        "list": [1, 2, 3, 4, 5],
        "empty_list": [],
        "empty_object": {},
        "flags": [true, false, null],
        "nested": { "list": ["a", "b"] },
        "weird key": "spaced"
    })
}
