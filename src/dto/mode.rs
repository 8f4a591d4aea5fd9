use serde::Serialize;
use utoipa::ToSchema;

use crate::config::ModeConfig;

/// Deployment flags clients use to adapt their forms.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModeConfigResponse {
    /// New contests are manually controlled by default.
    pub manual_control_default: bool,
    /// Joining closes once voting opens.
    pub disable_join_when_voting_starts: bool,
    /// Identities are usernames rather than email addresses.
    pub username_only_mode: bool,
    /// A shared participant password is configured.
    pub fixed_password_mode: bool,
}

impl From<&ModeConfig> for ModeConfigResponse {
    fn from(value: &ModeConfig) -> Self {
        Self {
            manual_control_default: value.manual_control_default,
            disable_join_when_voting_starts: value.disable_join_when_voting_starts,
            username_only_mode: value.username_only_mode,
            fixed_password_mode: value.fixed_password_mode,
        }
    }
}
