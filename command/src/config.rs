use kiln_core::{QueueKind, QueuePriority};

/// Configuration of a single queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueConfig {
    /// Scheduling priority.
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: QueuePriority,
}

/// Configuration of the command layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derivative::Derivative)]
#[derivative(Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Graphics queue configuration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub graphics: QueueConfig,

    /// Compute queue configuration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub compute: QueueConfig,

    /// Copy queue configuration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub copy: QueueConfig,

    /// Attach recording names to backend command lists.
    #[derivative(Default(value = "true"))]
    #[cfg_attr(feature = "serde", serde(default = "label_objects_default"))]
    pub label_objects: bool,
}

#[cfg(feature = "serde")]
fn label_objects_default() -> bool {
    true
}

impl Config {
    /// Configuration of the queue of `kind`.
    pub fn queue(&self, kind: QueueKind) -> &QueueConfig {
        match kind {
            QueueKind::Graphics => &self.graphics,
            QueueKind::Compute => &self.compute,
            QueueKind::Copy => &self.copy,
        }
    }
}
