use core::ffi::c_int;

use log::{error, info};

use crate::{error::KernelResult as Result, registry::RegistryRef};

/// Metadata a module declares about itself.
#[derive(Debug)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub license: &'static str,
}

/// Equivalent to `THIS_MODULE` in the C API.
///
/// Recorded as the owner of everything the module publishes.
#[derive(Debug)]
pub struct ThisModule(&'static ModuleInfo);

impl ThisModule {
    pub const fn new(info: &'static ModuleInfo) -> ThisModule {
        ThisModule(info)
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn info(&self) -> &'static ModuleInfo {
        self.0
    }
}

/// The top level entrypoint to implementing a kernel module.
///
/// For any teardown or cleanup operations, your type may implement [`Drop`].
pub trait Module: Sized + Sync {
    /// Called at module initialization time.
    ///
    /// Use this method to perform whatever setup or registration your module
    /// should do. On error nothing the module registered may remain.
    ///
    /// Equivalent to the `module_init` macro in the C API.
    fn init(module: &'static ThisModule, env: RegistryRef) -> Result<Self>;
}

/// A successfully loaded module.
///
/// The only way to get one is [`load`], and [`LoadedModule::unload`] consumes
/// it, so a module is unloaded at most once and only after it loaded.
pub struct LoadedModule<M: Module> {
    module: M,
    this: &'static ThisModule,
}

/// The load hook. Equivalent to `module_init`.
///
/// Returns the negative errno to report to the host on failure.
pub fn load<M: Module>(
    this: &'static ThisModule,
    env: RegistryRef,
) -> core::result::Result<LoadedModule<M>, c_int> {
    match M::init(this, env) {
        Ok(module) => {
            info!("{}: loaded", this.name());
            Ok(LoadedModule { module, this })
        }
        Err(e) => {
            error!("{}: init failed: {:?}", this.name(), e);
            Err(e.to_errno())
        }
    }
}

impl<M: Module> LoadedModule<M> {
    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn this_module(&self) -> &'static ThisModule {
        self.this
    }

    /// The unload hook. Equivalent to `module_exit`.
    pub fn unload(self) {
        let name = self.this.name();
        drop(self.module);
        info!("{}: unloaded", name);
    }
}

/// Declares a module's metadata and its load hook.
///
/// Expands to a `THIS_MODULE` static and an `init_module` function that
/// loads the given type.
///
/// # Examples
///
/// ```ignore
/// kernel::module! {
///     type: MyModule,
///     name: "my_module",
///     author: "Someone",
///     description: "An example",
///     license: "GPL",
/// }
/// ```
#[macro_export]
macro_rules! module {
    (
        type: $type:ty,
        name: $name:expr,
        author: $author:expr,
        description: $description:expr,
        license: $license:expr $(,)?
    ) => {
        /// Metadata and owner token of this module.
        pub static THIS_MODULE: $crate::ThisModule =
            $crate::ThisModule::new(&$crate::module::ModuleInfo {
                name: $name,
                author: $author,
                description: $description,
                license: $license,
            });

        /// Loads the module against `env`.
        pub fn init_module(
            env: $crate::registry::RegistryRef,
        ) -> ::core::result::Result<$crate::module::LoadedModule<$type>, ::core::ffi::c_int> {
            $crate::module::load::<$type>(&THIS_MODULE, env)
        }
    };
}
