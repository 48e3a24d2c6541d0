//! The C ABI a compiled patcher library must export. Mirrors the original
//! `PatcherFactory` interface as a flat extern "C" vtable, since Rust trait
//! objects aren't FFI-safe across a `dlopen` boundary.

use std::os::raw::{c_char, c_void};

/// Opaque handle to a factory-owned DSP instance.
pub type RnboInstanceHandle = *mut c_void;
/// Opaque handle to the loaded factory itself.
pub type RnboFactoryHandle = *mut c_void;

pub const SYMBOL_CREATE_FACTORY: &[u8] = b"rnbo_create_factory\0";
pub const SYMBOL_DESTROY_FACTORY: &[u8] = b"rnbo_destroy_factory\0";
pub const SYMBOL_CREATE_INSTANCE: &[u8] = b"rnbo_factory_create_instance\0";
pub const SYMBOL_DESTROY_INSTANCE: &[u8] = b"rnbo_instance_destroy\0";
pub const SYMBOL_NUM_INPUTS: &[u8] = b"rnbo_instance_num_inputs\0";
pub const SYMBOL_NUM_OUTPUTS: &[u8] = b"rnbo_instance_num_outputs\0";
pub const SYMBOL_PROCESS: &[u8] = b"rnbo_instance_process\0";
pub const SYMBOL_PARAM_COUNT: &[u8] = b"rnbo_instance_param_count\0";
pub const SYMBOL_PARAM_NAME: &[u8] = b"rnbo_instance_param_name\0";
pub const SYMBOL_GET_PARAM: &[u8] = b"rnbo_instance_get_param\0";
pub const SYMBOL_SET_PARAM: &[u8] = b"rnbo_instance_set_param\0";
pub const SYMBOL_PARAM_MIN: &[u8] = b"rnbo_instance_param_min\0";
pub const SYMBOL_PARAM_MAX: &[u8] = b"rnbo_instance_param_max\0";
pub const SYMBOL_INPORT_COUNT: &[u8] = b"rnbo_instance_inport_count\0";
pub const SYMBOL_INPORT_TAG: &[u8] = b"rnbo_instance_inport_tag\0";
pub const SYMBOL_SEND_INPORT: &[u8] = b"rnbo_instance_send_inport\0";
pub const SYMBOL_OUTPORT_COUNT: &[u8] = b"rnbo_instance_outport_count\0";
pub const SYMBOL_OUTPORT_TAG: &[u8] = b"rnbo_instance_outport_tag\0";
pub const SYMBOL_POLL_OUTPORT: &[u8] = b"rnbo_instance_poll_outport\0";

pub type CreateFactoryFn = unsafe extern "C" fn() -> RnboFactoryHandle;
pub type DestroyFactoryFn = unsafe extern "C" fn(RnboFactoryHandle);
pub type CreateInstanceFn = unsafe extern "C" fn(RnboFactoryHandle) -> RnboInstanceHandle;
pub type DestroyInstanceFn = unsafe extern "C" fn(RnboInstanceHandle);
pub type NumInputsFn = unsafe extern "C" fn(RnboInstanceHandle) -> u32;
pub type NumOutputsFn = unsafe extern "C" fn(RnboInstanceHandle) -> u32;
pub type ProcessFn = unsafe extern "C" fn(
    RnboInstanceHandle,
    inputs: *const *const f32,
    outputs: *mut *mut f32,
    frames: u32,
);
pub type ParamCountFn = unsafe extern "C" fn(RnboInstanceHandle) -> u32;
pub type ParamNameFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32) -> *const c_char;
pub type GetParamFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32) -> f64;
pub type SetParamFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32, value: f64);
pub type ParamMinFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32) -> f64;
pub type ParamMaxFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32) -> f64;
pub type InportCountFn = unsafe extern "C" fn(RnboInstanceHandle) -> u32;
pub type InportTagFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32) -> *const c_char;
pub type SendInportFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32, value: f64);
pub type OutportCountFn = unsafe extern "C" fn(RnboInstanceHandle) -> u32;
pub type OutportTagFn = unsafe extern "C" fn(RnboInstanceHandle, index: u32) -> *const c_char;
/// Drains one pending outport fire. Returns `false` (and leaves `index`/
/// `value` untouched) when nothing fired since the last poll; realtime-safe,
/// meant to be called from the audio thread once per process block.
pub type PollOutportFn = unsafe extern "C" fn(RnboInstanceHandle, index: *mut u32, value: *mut f64) -> bool;
