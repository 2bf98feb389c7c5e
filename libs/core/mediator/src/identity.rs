use uuid::Uuid;

/// The authenticated caller behind a request
pub trait CurrentUser: Send + Sync {
    fn user_id(&self) -> Option<Uuid>;

    fn user_name(&self) -> Option<String> {
        None
    }

    fn roles(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    fn is_in_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// A caller known up front, e.g. a background job or a test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedUser {
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub roles: Vec<String>,
}

impl FixedUser {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user_id: Uuid, user_name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            user_name: Some(user_name.into()),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

impl CurrentUser for FixedUser {
    fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn user_name(&self) -> Option<String> {
        self.user_name.clone()
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }
}
