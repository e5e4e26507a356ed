use {
    super::{CommandContext, BARRIER_BUFFER_SIZE},
    kiln_core::{Backend, Barrier, BarrierSplit, CommandList as _, ResourceState},
    kiln_resource::Resource,
};

impl<'a, B> CommandContext<'a, B>
where
    B: Backend,
{
    fn push_barrier(&mut self, barrier: Barrier<B::Resource>) {
        assert!(
            self.data.barriers.len() < BARRIER_BUFFER_SIZE,
            "Barrier buffer overflow"
        );
        self.data.barriers.push(barrier);
    }

    fn flush_if(&mut self, flush_immediate: bool) {
        if flush_immediate || self.data.barriers.len() >= BARRIER_BUFFER_SIZE {
            self.flush_resource_barriers();
        }
    }

    /// Transition `resource` into `state`.
    ///
    /// Nothing is recorded if the resource is already in `state`.
    /// A split transition begun towards `state` is ended instead of recording a full barrier.
    /// A split transition towards another state is completed first.
    ///
    /// The resource state is updated immediately. The barrier is buffered
    /// until the buffer is full, `flush_immediate` is set or work that needs it is recorded.
    pub fn transition_resource(
        &mut self,
        resource: &mut Resource<B>,
        state: ResourceState,
        flush_immediate: bool,
    ) {
        assert!(state.is_valid(), "Invalid resource state {:?}", state);

        match resource.transition_state() {
            Some(pending) if pending == state => {
                self.push_barrier(Barrier::Transition {
                    resource: resource.raw().clone(),
                    before: resource.usage_state(),
                    after: state,
                    split: BarrierSplit::EndOnly,
                });
                resource.set_transition_state(None);
                resource.set_usage_state(state);
            }
            Some(pending) => {
                self.transition_resource(resource, pending, false);
                self.transition_resource(resource, state, flush_immediate);
                return;
            }
            None if resource.usage_state() != state => {
                self.push_barrier(Barrier::Transition {
                    resource: resource.raw().clone(),
                    before: resource.usage_state(),
                    after: state,
                    split: BarrierSplit::None,
                });
                resource.set_usage_state(state);
            }
            None => {}
        }

        self.flush_if(flush_immediate);
    }

    /// Begin split transition of `resource` into `state`.
    /// The resource must not be used until the transition is completed with
    /// [`transition_resource`](#method.transition_resource).
    ///
    /// A split transition towards another state is completed first.
    /// If the resource already is in `UNORDERED_ACCESS` and that is requested,
    /// an unordered access barrier is recorded instead.
    pub fn begin_transition_resource(
        &mut self,
        resource: &mut Resource<B>,
        state: ResourceState,
        flush_immediate: bool,
    ) {
        assert!(state.is_valid(), "Invalid resource state {:?}", state);

        match resource.transition_state() {
            Some(pending) if pending == state => {
                self.flush_if(flush_immediate);
                return;
            }
            Some(pending) => self.transition_resource(resource, pending, false),
            None => {}
        }

        if resource.usage_state() != state {
            self.push_barrier(Barrier::Transition {
                resource: resource.raw().clone(),
                before: resource.usage_state(),
                after: state,
                split: BarrierSplit::BeginOnly,
            });
            resource.set_transition_state(Some(state));
        } else if state == ResourceState::UNORDERED_ACCESS {
            self.push_barrier(Barrier::UnorderedAccess {
                resource: Some(resource.raw().clone()),
            });
        }

        self.flush_if(flush_immediate);
    }

    /// Order unordered access writes to `resource`, or to all resources if `None`.
    pub fn insert_uav_barrier(&mut self, resource: Option<&Resource<B>>, flush_immediate: bool) {
        self.push_barrier(Barrier::UnorderedAccess {
            resource: resource.map(|resource| resource.raw().clone()),
        });
        self.flush_if(flush_immediate);
    }

    /// Switch memory shared by aliased resources from `before` to `after`.
    /// `None` stands for any resource.
    pub fn insert_alias_barrier(
        &mut self,
        before: Option<&Resource<B>>,
        after: Option<&Resource<B>>,
        flush_immediate: bool,
    ) {
        self.push_barrier(Barrier::Aliasing {
            before: before.map(|resource| resource.raw().clone()),
            after: after.map(|resource| resource.raw().clone()),
        });
        self.flush_if(flush_immediate);
    }

    /// Record all buffered barriers into the list.
    pub fn flush_resource_barriers(&mut self) {
        if !self.data.barriers.is_empty() {
            log::trace!(
                "Context {} flushes {} barriers",
                self.data.id,
                self.data.barriers.len()
            );
            self.data.list.resource_barrier(&self.data.barriers);
            self.data.barriers.clear();
        }
    }
}
