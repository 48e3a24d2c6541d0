//! Loads a compiled patcher library and exposes its factory entry point.

use std::path::Path;
use std::sync::Arc;

use libloading::Library;

use crate::error::PatcherLoadError;
use crate::ffi::*;
use crate::instance::PatcherInstance;

/// A loaded patcher library's factory. Keeps the library mapped for as long
/// as any `PatcherInstance` created from it is alive.
pub struct PatcherFactory {
    lib: Arc<Library>,
    handle: RnboFactoryHandle,
    destroy_factory: DestroyFactoryFn,
    create_instance_fn: CreateInstanceFn,
    destroy_instance_fn: DestroyInstanceFn,
    num_inputs_fn: NumInputsFn,
    num_outputs_fn: NumOutputsFn,
    process_fn: ProcessFn,
    param_count_fn: ParamCountFn,
    param_name_fn: ParamNameFn,
    get_param_fn: GetParamFn,
    set_param_fn: SetParamFn,
    param_min_fn: ParamMinFn,
    param_max_fn: ParamMaxFn,
    inport_count_fn: InportCountFn,
    inport_tag_fn: InportTagFn,
    send_inport_fn: SendInportFn,
    outport_count_fn: OutportCountFn,
    outport_tag_fn: OutportTagFn,
    poll_outport_fn: PollOutportFn,
}

unsafe impl Send for PatcherFactory {}
unsafe impl Sync for PatcherFactory {}

impl PatcherFactory {
    /// Opens `path` and resolves every required export, then calls the
    /// library's `rnbo_create_factory` entry point.
    pub fn load(path: &Path) -> Result<Self, PatcherLoadError> {
        unsafe {
            let lib = Library::new(path)?;

            macro_rules! resolve {
                ($name:ident, $sym:expr) => {
                    *lib.get::<$name>($sym)
                        .map_err(|_| PatcherLoadError::MissingSymbol(String::from_utf8_lossy(&$sym[..$sym.len() - 1]).to_string()))?
                };
            }

            let create_factory: CreateFactoryFn = resolve!(CreateFactoryFn, SYMBOL_CREATE_FACTORY);
            let destroy_factory: DestroyFactoryFn = resolve!(DestroyFactoryFn, SYMBOL_DESTROY_FACTORY);
            let create_instance_fn: CreateInstanceFn = resolve!(CreateInstanceFn, SYMBOL_CREATE_INSTANCE);
            let destroy_instance_fn: DestroyInstanceFn = resolve!(DestroyInstanceFn, SYMBOL_DESTROY_INSTANCE);
            let num_inputs_fn: NumInputsFn = resolve!(NumInputsFn, SYMBOL_NUM_INPUTS);
            let num_outputs_fn: NumOutputsFn = resolve!(NumOutputsFn, SYMBOL_NUM_OUTPUTS);
            let process_fn: ProcessFn = resolve!(ProcessFn, SYMBOL_PROCESS);
            let param_count_fn: ParamCountFn = resolve!(ParamCountFn, SYMBOL_PARAM_COUNT);
            let param_name_fn: ParamNameFn = resolve!(ParamNameFn, SYMBOL_PARAM_NAME);
            let get_param_fn: GetParamFn = resolve!(GetParamFn, SYMBOL_GET_PARAM);
            let set_param_fn: SetParamFn = resolve!(SetParamFn, SYMBOL_SET_PARAM);
            let param_min_fn: ParamMinFn = resolve!(ParamMinFn, SYMBOL_PARAM_MIN);
            let param_max_fn: ParamMaxFn = resolve!(ParamMaxFn, SYMBOL_PARAM_MAX);
            let inport_count_fn: InportCountFn = resolve!(InportCountFn, SYMBOL_INPORT_COUNT);
            let inport_tag_fn: InportTagFn = resolve!(InportTagFn, SYMBOL_INPORT_TAG);
            let send_inport_fn: SendInportFn = resolve!(SendInportFn, SYMBOL_SEND_INPORT);
            let outport_count_fn: OutportCountFn = resolve!(OutportCountFn, SYMBOL_OUTPORT_COUNT);
            let outport_tag_fn: OutportTagFn = resolve!(OutportTagFn, SYMBOL_OUTPORT_TAG);
            let poll_outport_fn: PollOutportFn = resolve!(PollOutportFn, SYMBOL_POLL_OUTPORT);

            let handle = create_factory();
            if handle.is_null() {
                return Err(PatcherLoadError::NullFactory);
            }

            Ok(Self {
                lib: Arc::new(lib),
                handle,
                destroy_factory,
                create_instance_fn,
                destroy_instance_fn,
                num_inputs_fn,
                num_outputs_fn,
                process_fn,
                param_count_fn,
                param_name_fn,
                get_param_fn,
                set_param_fn,
                param_min_fn,
                param_max_fn,
                inport_count_fn,
                inport_tag_fn,
                send_inport_fn,
                outport_count_fn,
                outport_tag_fn,
                poll_outport_fn,
            })
        }
    }

    pub fn create_instance(&self) -> Result<PatcherInstance, PatcherLoadError> {
        let handle = unsafe { (self.create_instance_fn)(self.handle) };
        if handle.is_null() {
            return Err(PatcherLoadError::NullFactory);
        }
        Ok(PatcherInstance::new(
            self.lib.clone(),
            handle,
            self.destroy_instance_fn,
            self.num_inputs_fn,
            self.num_outputs_fn,
            self.process_fn,
            self.param_count_fn,
            self.param_name_fn,
            self.get_param_fn,
            self.set_param_fn,
            self.param_min_fn,
            self.param_max_fn,
            self.inport_count_fn,
            self.inport_tag_fn,
            self.send_inport_fn,
            self.outport_count_fn,
            self.outport_tag_fn,
            self.poll_outport_fn,
        ))
    }
}

impl Drop for PatcherFactory {
    fn drop(&mut self) {
        unsafe { (self.destroy_factory)(self.handle) }
    }
}

