use serde::{Deserialize, Serialize};

use crate::error::{JudgeSimError, Result};

pub type ContainerId = u64;

/// Identity and capacity of one judging container, supplied at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub container_id: ContainerId,
    /// Total memory of the slot in bytes.
    pub memory: u64,
    /// Host placeholder. `None` means local.
    #[serde(default)]
    pub machine_id: Option<u64>,
}

impl ContainerSpec {
    pub fn new(container_id: ContainerId, memory: u64) -> Self {
        Self {
            container_id,
            memory,
            machine_id: None,
        }
    }

    pub fn on_machine(mut self, machine_id: u64) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory == 0 {
            return Err(JudgeSimError::InvalidContainer {
                container_id: self.container_id,
                reason: "memory must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_memory_is_invalid() {
        assert!(ContainerSpec::new(0, 0).validate().is_err());
        assert!(ContainerSpec::new(0, 1).validate().is_ok());
    }

    #[test]
    fn machine_id_defaults_to_local() {
        let spec: ContainerSpec =
            serde_json::from_str(r#"{"container_id": 2, "memory": 1024}"#).unwrap();
        assert_eq!(spec, ContainerSpec::new(2, 1024));
        assert_eq!(ContainerSpec::new(2, 1024).on_machine(5).machine_id, Some(5));
    }
}
