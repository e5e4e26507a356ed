use {
    kiln_command::{CommandContext, CommandContextManager, CommandManager, Config},
    kiln_core::{Backend, DeviceError, QueueKind},
    std::sync::Arc,
};

/// Initialized command submission of one device.
///
/// Owns the [`CommandManager`] and the [`CommandContextManager`] built on top of it
/// and destroys them in the right order.
///
/// [`CommandManager`]: ../kiln_command/struct.CommandManager.html
/// [`CommandContextManager`]: ../kiln_command/struct.CommandContextManager.html
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Commands<B: Backend> {
    contexts: CommandContextManager<B>,
}

impl<B> Commands<B>
where
    B: Backend,
{
    /// Create queues of every kind and an empty context pool.
    pub fn new(device: Arc<B::Device>, config: Config) -> Result<Self, DeviceError> {
        let manager = CommandManager::new(device, config)?;
        log::debug!("Kiln initialized");
        Ok(Commands {
            contexts: CommandContextManager::new(Arc::new(manager)),
        })
    }

    /// Device the queues belong to.
    pub fn device(&self) -> &Arc<B::Device> {
        self.manager().device()
    }

    /// Queues and fence tracking.
    pub fn manager(&self) -> &CommandManager<B> {
        self.contexts.manager()
    }

    /// Context pool.
    pub fn contexts(&self) -> &CommandContextManager<B> {
        &self.contexts
    }

    /// Begin recording commands of `kind`.
    pub fn begin(&self, kind: QueueKind, name: &str) -> CommandContext<'_, B> {
        match kind {
            QueueKind::Graphics => self.contexts.begin(name),
            QueueKind::Compute => self.contexts.begin_compute(name),
            QueueKind::Copy => self.contexts.begin_copy(name),
        }
    }

    /// Wait for the device to finish all submitted work and destroy contexts and queues.
    ///
    /// Resources created by the caller are not touched
    /// and may be destroyed with the returned device afterwards.
    ///
    /// # Panics
    ///
    /// Panics if a context is not finished or the command manager is still shared.
    pub fn dispose(self) -> Arc<B::Device> {
        #[cfg(feature = "profiler")]
        thread_profiler::profile_scope!("dispose");

        self.contexts.manager().wait_for_idle_gpu();
        let manager = match Arc::try_unwrap(self.contexts.dispose()) {
            Ok(manager) => manager,
            Err(_) => panic!("Command manager is still shared"),
        };
        unsafe {
            // Every context is finished so every allocator is back in its pool.
            manager.dispose()
        }
    }
}
