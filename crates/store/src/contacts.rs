//! Contact store — read-only lookups from the engine's perspective.

use dashmap::DashMap;
use uuid::Uuid;

use coldreach_core::types::Contact;

pub struct ContactStore {
    contacts: DashMap<Uuid, Contact>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self {
            contacts: DashMap::new(),
        }
    }

    pub fn insert(&self, contact: Contact) -> Uuid {
        let id = contact.id;
        self.contacts.insert(id, contact);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<Contact> {
        self.contacts.get(&id).map(|r| r.value().clone())
    }

    pub fn list(&self) -> Vec<Contact> {
        self.contacts.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

impl Default for ContactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldreach_core::types::Company;

    #[test]
    fn test_insert_and_lookup() {
        let store = ContactStore::new();
        let contact = Contact {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: Some("ada@analytical.example".into()),
            phone: None,
            linkedin_url: Some("https://linkedin.com/in/ada".into()),
            job_title: Some("Engineer".into()),
            company: Some(Company {
                name: "Analytical Engines".into(),
                industry: Some("Computing".into()),
                website: None,
            }),
        };
        let id = store.insert(contact);
        let fetched = store.get(id).unwrap();
        assert_eq!(fetched.full_name(), "Ada Lovelace");
        assert_eq!(store.len(), 1);
    }
}
