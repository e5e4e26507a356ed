use super::ResourceState;

/// Part of a split transition a barrier stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BarrierSplit {
    /// Complete transition.
    None,

    /// Starts a transition. The resource must not be used until a matching `EndOnly` barrier.
    BeginOnly,

    /// Completes a previously started transition.
    EndOnly,
}

impl Default for BarrierSplit {
    fn default() -> Self {
        BarrierSplit::None
    }
}

/// Barrier recorded into a command list.
///
/// `R` is the backend resource handle.
#[derive(Clone, Debug, PartialEq)]
pub enum Barrier<R> {
    /// State transition of the whole resource.
    Transition {
        /// Transitioned resource.
        resource: R,
        /// State before the transition.
        before: ResourceState,
        /// State after the transition.
        after: ResourceState,
        /// Split part.
        split: BarrierSplit,
    },

    /// Switch between resources sharing the same memory.
    /// `None` stands for any resource.
    Aliasing {
        /// Resource that stops using the memory.
        before: Option<R>,
        /// Resource that starts using the memory.
        after: Option<R>,
    },

    /// Orders unordered access writes of a resource.
    /// `None` stands for all resources.
    UnorderedAccess {
        /// Resource the barrier applies to.
        resource: Option<R>,
    },
}

impl<R> Barrier<R> {
    /// Resource the barrier refers to, if any.
    pub fn resource(&self) -> Option<&R> {
        match self {
            Barrier::Transition { resource, .. } => Some(resource),
            Barrier::Aliasing { after, before } => after.as_ref().or(before.as_ref()),
            Barrier::UnorderedAccess { resource } => resource.as_ref(),
        }
    }

    /// Convert resource handle of the barrier.
    pub fn map<T>(self, mut f: impl FnMut(R) -> T) -> Barrier<T> {
        match self {
            Barrier::Transition {
                resource,
                before,
                after,
                split,
            } => Barrier::Transition {
                resource: f(resource),
                before,
                after,
                split,
            },
            Barrier::Aliasing { before, after } => Barrier::Aliasing {
                before: before.map(&mut f),
                after: after.map(&mut f),
            },
            Barrier::UnorderedAccess { resource } => Barrier::UnorderedAccess {
                resource: resource.map(f),
            },
        }
    }
}
