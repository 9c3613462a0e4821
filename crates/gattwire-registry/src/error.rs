/// Errors that can occur while configuring or updating the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A registration named no access levels.
    #[error("access level set must not be empty")]
    EmptyLevelSet,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
