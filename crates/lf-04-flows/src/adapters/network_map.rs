use crate::ports::outbound::IdentityService;
use parking_lot::RwLock;
use shared_types::{Party, PartyName, PublicKey};
use std::collections::HashMap;

/// Injected directory of every party on the network.
#[derive(Debug, Default)]
pub struct NetworkMap {
    by_key: RwLock<HashMap<PublicKey, Party>>,
    by_name: RwLock<HashMap<PartyName, Party>>,
}

impl NetworkMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, party: Party) {
        self.by_key.write().insert(party.owning_key, party.clone());
        self.by_name.write().insert(party.name.clone(), party);
    }

    pub fn parties(&self) -> Vec<Party> {
        let mut parties: Vec<_> = self.by_name.read().values().cloned().collect();
        parties.sort();
        parties
    }
}

impl IdentityService for NetworkMap {
    fn party_from_key(&self, key: &PublicKey) -> Option<Party> {
        self.by_key.read().get(key).cloned()
    }

    fn party_from_name(&self, name: &PartyName) -> Option<Party> {
        self.by_name.read().get(name).cloned()
    }
}
