//! Random display names for chat sessions.

use rand::seq::IndexedRandom;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Andrew", "Barbara", "Carlos", "Charlotte", "Daniel", "Diana", "Edward", "Elena",
    "Frank", "Grace", "Henry", "Irene", "Jack", "Julia", "Kevin", "Laura", "Martin", "Nancy",
    "Oliver", "Patricia", "Robert", "Sofia", "Thomas", "Victoria", "William",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Baker", "Clark", "Davis", "Evans", "Foster", "Garcia", "Harris", "Jackson",
    "Kelly", "Lewis", "Martinez", "Nelson", "Owens", "Parker", "Roberts", "Scott", "Turner",
    "Walker", "Young",
];

/// Generate a random "First Last" display name.
pub fn full_name() -> String {
    let mut rng = rand::rng();
    let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Anonymous");
    let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Guest");
    format!("{first} {last}")
}
