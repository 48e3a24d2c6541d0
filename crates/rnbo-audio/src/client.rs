//! Per-instance JACK client: registers audio/MIDI ports for one DSP
//! instance, runs its realtime process callback, and auto-connects once at
//! activation.

use std::sync::Arc;

use jack::{AudioIn, AudioOut, Client, ClientOptions, Control, MidiIn, MidiOut, Port, ProcessScope};
use rtrb::Producer;

use rnbo_instance::{Instance, InstanceEvent};

use crate::auto_connect::{self, AutoConnectPolicy};
use crate::error::AudioError;
use crate::midi_bridge::frame_to_ms;
use crate::transport::{self, TransportSnapshot};

/// The introspection/control client name every runner registers, regardless
/// of how many instance clients are also active.
pub const INFO_CLIENT_NAME: &str = "rnbo-info";

pub struct InstanceAudioClient {
    _async_client: jack::AsyncClient<Notifications, Processor>,
    pub client_name: String,
    pub sample_rate: u32,
    pub buffer_size: u32,
}

impl InstanceAudioClient {
    pub fn latency_ms(&self) -> f64 {
        self.buffer_size as f64 / self.sample_rate.max(1) as f64 * 1000.0
    }
}

struct Processor {
    instance: Arc<Instance>,
    in_ports: Vec<Port<AudioIn>>,
    out_ports: Vec<Port<AudioOut>>,
    midi_in: Port<MidiIn>,
    midi_out: Port<MidiOut>,
    events_tx: Option<Producer<InstanceEvent>>,
    sample_rate: u32,
    last_transport: TransportSnapshot,
    last_param_values: Vec<f64>,
    // Reused across calls so the DSP's `process()` never has to allocate a
    // fresh `Vec` per callback. Cleared and refilled every cycle; the
    // `'static` lifetime is a lie we only tell ourselves for one call --
    // nothing retains a slice past the end of `process()`, and `Processor`
    // itself never outlives the ports it borrows from.
    in_bufs: Vec<&'static [f32]>,
    out_bufs: Vec<&'static mut [f32]>,
}

impl jack::ProcessHandler for Processor {
    fn process(&mut self, client: &Client, ps: &ProcessScope) -> Control {
        let n_frames = ps.n_frames() as usize;

        // 1. MIDI in: convert each raw JACK event to a (status,data0,data1)
        // triple and dispatch through the instance's map. The map's mutex is
        // only ever contended by control-thread writers, so this read never
        // blocks in practice. Any bound parameter write and any detected
        // program change is reported through the event ring rather than
        // touched in the tree directly -- the tree's own mutex is only
        // ever meant to be taken from the control thread.
        if let Some(tx) = &mut self.events_tx {
            for raw in self.midi_in.iter(ps) {
                if raw.bytes.len() < 2 {
                    continue;
                }
                let status = raw.bytes[0];
                let data0 = raw.bytes[1];
                let data1 = *raw.bytes.get(2).unwrap_or(&0);
                let _offset_ms = frame_to_ms(raw.time, self.sample_rate);
                self.instance.dispatch_midi(status, data0, data1, tx);
            }
        }

        // 2. Transport: query and translate; the instance doesn't currently
        // consume it directly since the invented patcher ABI has no
        // transport-event entry point, but the snapshot is kept for chaining
        // into a future DSP transport callback.
        let (state, position) = client.transport_query();
        let snapshot = transport::translate(
            state == jack::TransportState::Rolling,
            position.bpm().unwrap_or(120.0),
            position.time_sig_numerator().unwrap_or(4) as i32,
            position.time_sig_denominator().unwrap_or(4) as i32,
            position.bar().unwrap_or(1) as i32,
            position.beat().unwrap_or(1) as i32,
            position.tick().unwrap_or(0) as f64,
            position.ticks_per_beat().unwrap_or(960.0),
        );
        if snapshot.differs_from(&self.last_transport) {
            log::debug!("transport changed: {:?}", snapshot);
        }
        self.last_transport = snapshot;

        // 3. Run the DSP. `in_bufs`/`out_bufs` are preallocated once at
        // activation and only refilled here; the transmute just erases the
        // borrow from `ps`, which is sound since both vectors are drained
        // and refilled before this function returns and never read outside
        // of it.
        self.in_bufs.clear();
        for port in &self.in_ports {
            let slice = port.as_slice(ps);
            self.in_bufs.push(unsafe { std::mem::transmute::<&[f32], &'static [f32]>(slice) });
        }
        self.out_bufs.clear();
        for port in &mut self.out_ports {
            let slice = port.as_mut_slice(ps);
            self.out_bufs.push(unsafe { std::mem::transmute::<&mut [f32], &'static mut [f32]>(slice) });
        }
        self.instance.patcher().process(&self.in_bufs, &mut self.out_bufs, n_frames);

        // 4. Apply the fade envelope in-place over the instance's outputs.
        let delta_ms = n_frames as f64 * 1000.0 / self.sample_rate.max(1) as f64;
        let gain = self.instance.fade().advance(delta_ms);
        if gain < 1.0 {
            for buf in self.out_bufs.iter_mut() {
                for sample in buf.iter_mut() {
                    *sample *= gain;
                }
            }
        }

        // 5. Outbound MIDI: the invented patcher ABI has no outport-MIDI
        // surface yet, so there is nothing to flush this cycle.
        let _ = self.midi_out.writer(ps);

        // 6. The invented ABI has no push notification for DSP-internal
        // automation, so parameter changes are detected by diffing against
        // the last-seen value and reported to the control thread.
        if let Some(tx) = &mut self.events_tx {
            for (index, last) in self.last_param_values.iter_mut().enumerate() {
                let current = self.instance.patcher().get_param(index);
                if (current - *last).abs() > f64::EPSILON {
                    let _ = tx.push(InstanceEvent::ParamChanged { index, value: current });
                    *last = current;
                }
            }

            // 7. Drain any outport fires the DSP queued up during `process`.
            while let Some((index, value)) = self.instance.patcher().poll_outport() {
                let _ = tx.push(InstanceEvent::PortMessage { index, value });
            }
        }

        Control::Continue
    }
}

struct Notifications;

impl jack::NotificationHandler for Notifications {
    fn xrun(&mut self, _client: &Client) -> Control {
        log::warn!("jack xrun detected");
        Control::Continue
    }
}

/// Registers a new JACK client named after the instance, wires its I/O
/// ports to the loaded DSP's channel counts, activates it, then applies the
/// requested auto-connect policy once.
pub fn activate_instance(
    instance: Arc<Instance>,
    client_name: &str,
    policy: AutoConnectPolicy,
) -> Result<InstanceAudioClient, AudioError> {
    let (client, _status) = Client::new(client_name, ClientOptions::NO_START_SERVER)
        .map_err(|e| AudioError::ClientCreate(e.to_string()))?;
    let actual_name = client.name().to_string();
    let sample_rate = client.sample_rate() as u32;
    let buffer_size = client.buffer_size();

    let num_inputs = instance.patcher().num_inputs();
    let num_outputs = instance.patcher().num_outputs();

    let mut in_ports = Vec::with_capacity(num_inputs);
    for i in 0..num_inputs {
        let port = client
            .register_port(&format!("in_{i}"), AudioIn::default())
            .map_err(|e| AudioError::PortRegister(e.to_string()))?;
        in_ports.push(port);
    }

    let mut out_ports = Vec::with_capacity(num_outputs);
    for i in 0..num_outputs {
        let port = client
            .register_port(&format!("out_{i}"), AudioOut::default())
            .map_err(|e| AudioError::PortRegister(e.to_string()))?;
        out_ports.push(port);
    }

    let midi_in = client
        .register_port("midi_in", MidiIn::default())
        .map_err(|e| AudioError::PortRegister(e.to_string()))?;
    let midi_out = client
        .register_port("midi_out", MidiOut::default())
        .map_err(|e| AudioError::PortRegister(e.to_string()))?;

    let events_tx = instance.take_events_producer();
    let last_param_values: Vec<f64> = (0..instance.patcher().param_count())
        .map(|i| instance.patcher().get_param(i))
        .collect();

    let in_bufs = Vec::with_capacity(num_inputs);
    let out_bufs = Vec::with_capacity(num_outputs);

    let processor = Processor {
        instance,
        in_ports,
        out_ports,
        midi_in,
        midi_out,
        events_tx,
        sample_rate,
        last_transport: TransportSnapshot::default(),
        last_param_values,
        in_bufs,
        out_bufs,
    };

    let async_client = client
        .activate_async(Notifications, processor)
        .map_err(|e| AudioError::ClientCreate(e.to_string()))?;

    let our_inputs: Vec<String> = (0..num_inputs).map(|i| format!("{actual_name}:in_{i}")).collect();
    let our_outputs: Vec<String> = (0..num_outputs).map(|i| format!("{actual_name}:out_{i}")).collect();
    let our_midi_in = vec![format!("{actual_name}:midi_in")];

    match policy {
        AutoConnectPolicy::Audio => auto_connect::connect_audio(async_client.as_client(), &our_inputs, &our_outputs),
        AutoConnectPolicy::Indexed => {
            let system_out = async_client.as_client().ports(Some("system:.*"), None, jack::PortFlags::IS_OUTPUT);
            auto_connect::connect_indexed(async_client.as_client(), &system_out, &our_inputs);
        }
        AutoConnectPolicy::Midi => auto_connect::connect_midi(async_client.as_client(), &our_midi_in, false),
        AutoConnectPolicy::MidiHardware => auto_connect::connect_midi(async_client.as_client(), &our_midi_in, true),
        AutoConnectPolicy::PortGroup => auto_connect::connect_port_group(async_client.as_client(), &our_inputs),
        AutoConnectPolicy::None => {}
    }

    Ok(InstanceAudioClient {
        _async_client: async_client,
        client_name: actual_name,
        sample_rate,
        buffer_size,
    })
}

/// Registers the always-on introspection client used for nothing but
/// identifying this runner's presence on the JACK graph.
pub fn register_info_client() -> Result<Client, AudioError> {
    let (client, _status) = Client::new(INFO_CLIENT_NAME, ClientOptions::NO_START_SERVER)
        .map_err(|e| AudioError::ClientCreate(e.to_string()))?;
    Ok(client)
}
