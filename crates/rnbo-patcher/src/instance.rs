//! A single DSP instance created from a `PatcherFactory`.

use std::ffi::CStr;
use std::sync::Arc;

use libloading::Library;

use crate::ffi::*;

pub struct PatcherInstance {
    // Kept alive so the library stays mapped while this instance exists.
    _lib: Arc<Library>,
    handle: RnboInstanceHandle,
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

unsafe impl Send for PatcherInstance {}

impl PatcherInstance {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        lib: Arc<Library>,
        handle: RnboInstanceHandle,
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
    ) -> Self {
        Self {
            _lib: lib,
            handle,
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
        }
    }

    pub fn num_inputs(&self) -> usize {
        unsafe { (self.num_inputs_fn)(self.handle) as usize }
    }

    pub fn num_outputs(&self) -> usize {
        unsafe { (self.num_outputs_fn)(self.handle) as usize }
    }

    pub fn param_count(&self) -> usize {
        unsafe { (self.param_count_fn)(self.handle) as usize }
    }

    pub fn param_name(&self, index: usize) -> String {
        unsafe {
            let ptr = (self.param_name_fn)(self.handle, index as u32);
            if ptr.is_null() {
                return String::new();
            }
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }

    pub fn get_param(&self, index: usize) -> f64 {
        unsafe { (self.get_param_fn)(self.handle, index as u32) }
    }

    pub fn set_param(&self, index: usize, value: f64) {
        unsafe { (self.set_param_fn)(self.handle, index as u32, value) }
    }

    pub fn param_min(&self, index: usize) -> f64 {
        unsafe { (self.param_min_fn)(self.handle, index as u32) }
    }

    pub fn param_max(&self, index: usize) -> f64 {
        unsafe { (self.param_max_fn)(self.handle, index as u32) }
    }

    pub fn inport_count(&self) -> usize {
        unsafe { (self.inport_count_fn)(self.handle) as usize }
    }

    pub fn inport_tag(&self, index: usize) -> String {
        unsafe {
            let ptr = (self.inport_tag_fn)(self.handle, index as u32);
            if ptr.is_null() {
                return String::new();
            }
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }

    /// Realtime-safe: no allocation, delivers a message straight to the DSP.
    pub fn send_inport(&self, index: usize, value: f64) {
        unsafe { (self.send_inport_fn)(self.handle, index as u32, value) }
    }

    pub fn outport_count(&self) -> usize {
        unsafe { (self.outport_count_fn)(self.handle) as usize }
    }

    pub fn outport_tag(&self, index: usize) -> String {
        unsafe {
            let ptr = (self.outport_tag_fn)(self.handle, index as u32);
            if ptr.is_null() {
                return String::new();
            }
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }

    /// Realtime-safe: no allocation. Drains one pending outport fire, if any.
    pub fn poll_outport(&self) -> Option<(usize, f64)> {
        let mut index: u32 = 0;
        let mut value: f64 = 0.0;
        let fired = unsafe { (self.poll_outport_fn)(self.handle, &mut index, &mut value) };
        fired.then_some((index as usize, value))
    }

    /// Realtime-safe: no allocation, called from the audio callback.
    ///
    /// # Panics
    /// In debug builds, if `inputs`/`outputs` don't match `num_inputs`/
    /// `num_outputs`.
    pub fn process(&self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], frames: usize) {
        debug_assert_eq!(inputs.len(), self.num_inputs());
        debug_assert_eq!(outputs.len(), self.num_outputs());

        let in_ptrs: Vec<*const f32> = inputs.iter().map(|s| s.as_ptr()).collect();
        let mut out_ptrs: Vec<*mut f32> = outputs.iter_mut().map(|s| s.as_mut_ptr()).collect();

        unsafe {
            (self.process_fn)(
                self.handle,
                in_ptrs.as_ptr(),
                out_ptrs.as_mut_ptr(),
                frames as u32,
            );
        }
    }
}

impl Drop for PatcherInstance {
    fn drop(&mut self) {
        unsafe { (self.destroy_instance_fn)(self.handle) }
    }
}
