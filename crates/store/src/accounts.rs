//! Sender account store — connected email and LinkedIn accounts.

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use coldreach_core::types::{EmailAccount, LinkedInAccount};

pub struct AccountStore {
    email_accounts: DashMap<Uuid, EmailAccount>,
    linkedin_accounts: DashMap<Uuid, LinkedInAccount>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            email_accounts: DashMap::new(),
            linkedin_accounts: DashMap::new(),
        }
    }

    pub fn insert_email_account(&self, account: EmailAccount) -> Uuid {
        let id = account.id;
        info!(account_id = %id, email = %account.email, "Email account connected");
        self.email_accounts.insert(id, account);
        id
    }

    pub fn email_account(&self, id: Uuid) -> Option<EmailAccount> {
        self.email_accounts.get(&id).map(|r| r.value().clone())
    }

    pub fn insert_linkedin_account(&self, account: LinkedInAccount) -> Uuid {
        let id = account.id;
        info!(account_id = %id, profile = %account.profile_name, "LinkedIn account connected");
        self.linkedin_accounts.insert(id, account);
        id
    }

    pub fn linkedin_account(&self, id: Uuid) -> Option<LinkedInAccount> {
        self.linkedin_accounts.get(&id).map(|r| r.value().clone())
    }

    pub fn deactivate_email_account(&self, id: Uuid) -> bool {
        match self.email_accounts.get_mut(&id) {
            Some(mut entry) => {
                entry.is_active = false;
                true
            }
            None => false,
        }
    }

    pub fn deactivate_linkedin_account(&self, id: Uuid) -> bool {
        match self.linkedin_accounts.get_mut(&id) {
            Some(mut entry) => {
                entry.is_active = false;
                true
            }
            None => false,
        }
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
