// 🧑‍⚖️ MEP Entity - Member of the European Parliament
//
// "The persistent id is IDENTITY, name and country are VALUES"
//
// The id comes from the parliament roster and matches the `PersId`
// attribute on roll-call voter records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// MEP - Equality and hashing by id only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mep {
    /// Stable identifier from the roster (persistent id)
    pub id: String,

    /// Full name as printed in the roster
    pub name: String,

    /// Member state the MEP was elected in
    pub country: String,
}

impl Mep {
    pub fn new(id: impl Into<String>, name: impl Into<String>, country: impl Into<String>) -> Self {
        Mep {
            id: id.into(),
            name: name.into(),
            country: country.into(),
        }
    }
}

impl PartialEq for Mep {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Mep {}

impl Hash for Mep {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Mep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mep_equality_by_id_only() {
        let a = Mep::new("197490", "Magdalena ADAMOWICZ", "Poland");
        let renamed = Mep::new("197490", "Magdalena Adamowicz", "Poland");
        let other = Mep::new("124831", "David McALLISTER", "Germany");

        assert_eq!(a, renamed);
        assert_ne!(a, other);

        let set: HashSet<Mep> = [a, renamed, other].into_iter().collect();
        assert_eq!(set.len(), 2, "Same id must collapse into one entry");
    }
}
