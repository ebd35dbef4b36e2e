//! Placeholder roster used before the first status events arrive

use crate::roster::Machine;

const SEED_FACTORIES: [(u32, &str, &str); 3] = [
    (1, "brazil", "Brazil"),
    (2, "italy", "Italy"),
    (3, "vietnam", "Vietnam"),
];

const SEED_MACHINES: [(&str, &str); 4] = [
    ("cnc", "CNC machine"),
    ("lathe", "Lathe machine"),
    ("assembly", "Assembly machine"),
    ("test", "Test machine"),
];

/// Four placeholder machines per default factory, all `Offline`
pub fn default_seed() -> Vec<Machine> {
    SEED_FACTORIES
        .iter()
        .flat_map(|(factory_id, slug, location)| {
            SEED_MACHINES.iter().map(move |(kind, label)| {
                Machine::placeholder(
                    &format!("{}_{}", kind, slug),
                    &format!("{} {}", label, location),
                    *factory_id,
                    location,
                )
            })
        })
        .collect()
}
