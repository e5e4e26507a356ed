use {
    super::CommandContext,
    kiln_core::{Backend, CommandList as _, PipelineKind},
    std::ops::{Deref, DerefMut},
};

fn group_count(threads: u32, group_size: u32) -> u32 {
    assert_ne!(group_size, 0, "Thread group size can't be zero");
    (threads + group_size - 1) / group_size
}

/// Compute view of a [`CommandContext`].
/// Graphics contexts can record compute work too.
///
/// [`CommandContext`]: struct.CommandContext.html
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct ComputeContext<'c, 'a, B: Backend> {
    context: &'c mut CommandContext<'a, B>,
}

impl<'c, 'a, B> ComputeContext<'c, 'a, B>
where
    B: Backend,
{
    pub(super) fn new(context: &'c mut CommandContext<'a, B>) -> Self {
        ComputeContext { context }
    }

    /// Bind root signature unless it is already bound.
    pub fn set_root_signature(&mut self, signature: &B::RootSignature) {
        let data = &mut self.context.data;
        if data.bound.compute_root_signature.as_ref() != Some(signature) {
            data.bound.compute_root_signature = Some(signature.clone());
            data.list.set_root_signature(PipelineKind::Compute, signature);
        }
    }

    /// Bind pipeline state unless it is already bound.
    pub fn set_pipeline_state(&mut self, pipeline: &B::PipelineState) {
        let data = &mut self.context.data;
        if data.bound.compute_pipeline_state.as_ref() != Some(pipeline) {
            data.bound.compute_pipeline_state = Some(pipeline.clone());
            data.list.set_pipeline_state(pipeline);
        }
    }

    /// Set 32-bit constants of root parameter `index`.
    pub fn set_constants(&mut self, index: u32, values: &[u32]) {
        self.context
            .data
            .list
            .set_root_constants(PipelineKind::Compute, index, values, 0);
    }

    /// Bind constant buffer at GPU `address` to root parameter `index`.
    pub fn set_constant_buffer(&mut self, index: u32, address: u64) {
        self.context
            .data
            .list
            .set_root_constant_buffer(PipelineKind::Compute, index, address);
    }

    /// Dispatch thread groups.
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.context.flush_resource_barriers();
        self.context.data.list.dispatch(x, y, z);
    }

    /// Dispatch enough groups of `group_size` to cover `threads`.
    pub fn dispatch_1d(&mut self, threads: u32, group_size: u32) {
        self.dispatch(group_count(threads, group_size), 1, 1);
    }

    /// Dispatch enough groups to cover `threads_x` by `threads_y` grid.
    pub fn dispatch_2d(&mut self, threads_x: u32, threads_y: u32, group_x: u32, group_y: u32) {
        self.dispatch(
            group_count(threads_x, group_x),
            group_count(threads_y, group_y),
            1,
        );
    }

    /// Dispatch enough groups to cover three-dimensional grid of threads.
    pub fn dispatch_3d(&mut self, threads: [u32; 3], group: [u32; 3]) {
        self.dispatch(
            group_count(threads[0], group[0]),
            group_count(threads[1], group[1]),
            group_count(threads[2], group[2]),
        );
    }
}

impl<'c, 'a, B> Deref for ComputeContext<'c, 'a, B>
where
    B: Backend,
{
    type Target = CommandContext<'a, B>;

    fn deref(&self) -> &CommandContext<'a, B> {
        &*self.context
    }
}

impl<'c, 'a, B> DerefMut for ComputeContext<'c, 'a, B>
where
    B: Backend,
{
    fn deref_mut(&mut self) -> &mut CommandContext<'a, B> {
        &mut *self.context
    }
}
