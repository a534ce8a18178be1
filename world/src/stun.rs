use crate::WorldError;

/// Counter of active stun sources on one actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StunStatus {
    active: u32,
}

impl StunStatus {
    /// Registers one more stun source.
    pub fn add_one(&mut self) {
        self.active = self.active.saturating_add(1);
    }

    /// Releases one stun source.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StunUnderflow`] when no stun source is active.
    pub fn remove_one(&mut self) -> Result<(), WorldError> {
        self.active = self
            .active
            .checked_sub(1)
            .ok_or(WorldError::StunUnderflow)?;
        Ok(())
    }

    /// Whether at least one stun source is active.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.active > 0
    }

    /// Number of active stun sources.
    #[must_use]
    pub fn active_sources(&self) -> u32 {
        self.active
    }
}
