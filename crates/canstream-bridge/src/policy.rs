use canstream_config::schema::{MissingPolicyKind, TargetConfig};

/// What the bridge does with a message whose target element is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingTargetPolicy {
    /// Discard without reporting anything.
    #[default]
    Drop,
    /// Keep up to `capacity` notifications (oldest evicted first) and
    /// replay them, in order, once the target accepts deliveries again.
    Buffer { capacity: usize },
    /// Report the miss to the caller.
    Error,
}

impl MissingTargetPolicy {
    pub fn from_config(config: &TargetConfig) -> Self {
        match config.missing_policy {
            MissingPolicyKind::Drop => Self::Drop,
            MissingPolicyKind::Buffer => Self::Buffer {
                capacity: (config.buffer_capacity as usize).max(1),
            },
            MissingPolicyKind::Error => Self::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_drop() {
        assert_eq!(
            MissingTargetPolicy::from_config(&TargetConfig::default()),
            MissingTargetPolicy::Drop
        );
    }

    #[test]
    fn buffer_carries_capacity() {
        let config = TargetConfig {
            missing_policy: MissingPolicyKind::Buffer,
            buffer_capacity: 8,
            ..Default::default()
        };
        assert_eq!(
            MissingTargetPolicy::from_config(&config),
            MissingTargetPolicy::Buffer { capacity: 8 }
        );
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let config = TargetConfig {
            missing_policy: MissingPolicyKind::Buffer,
            buffer_capacity: 0,
            ..Default::default()
        };
        assert_eq!(
            MissingTargetPolicy::from_config(&config),
            MissingTargetPolicy::Buffer { capacity: 1 }
        );
    }
}
