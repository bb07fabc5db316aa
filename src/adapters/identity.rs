use crate::domain::model::ActingUser;
use crate::domain::ports::IdentityProvider;
use crate::utils::error::{ChronicleError, Result};
use std::collections::HashMap;

/// Fixed set of known users, usually loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashMap<String, ActingUser>,
}

impl StaticDirectory {
    pub fn new(users: impl IntoIterator<Item = ActingUser>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityProvider for StaticDirectory {
    fn acting_user(&self, user_id: &str) -> Result<ActingUser> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ChronicleError::NotFoundError {
                entity: "user",
                id: user_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Role;

    #[test]
    fn test_lookup() {
        let directory = StaticDirectory::new(vec![
            ActingUser::new("hw-1", "Nurse Joy", Role::HealthcareWorker),
            ActingUser::new("p-1", "Ada", Role::Parent),
        ]);
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.acting_user("p-1").unwrap().role, Role::Parent);
        assert!(matches!(
            directory.acting_user("ghost"),
            Err(ChronicleError::NotFoundError { entity: "user", .. })
        ));
    }
}
